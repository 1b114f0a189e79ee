use std::{fmt::Display, path::PathBuf};

mod args;
mod assemble;
mod error;
pub mod number;

pub use args::{parse_pad, parse_positionals, parse_size, Positionals};
pub use assemble::{merge_files, AssemblyReport, Assembler, Placement};
pub use error::MergeError;

pub const FILE_MERGE_COUNTS_MAX: usize = 8;
pub const FILE_PATH_LENGTH_MAX: usize = 256;
pub const FILE_BUFFER_SIZE: usize = 1024 * 1024;
pub const FILE_SIZE_MAX: u64 = 256 * 1024 * 1024;

pub const DEFAULT_OUTPUT: &str = "output.bin";
pub const DEFAULT_PAD_BYTE: u8 = 0xFF;

/// Where an input starts in the output image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Offset {
    /// Absolute byte address.
    At(u64),
    /// Right after whatever was written last (`+` on the command line).
    Follow,
}
impl Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Offset::At(addr) => f.pad(&format!("0x{addr:08x}")),
            Offset::Follow => f.pad("+"),
        }
    }
}

/// One `<offset>@<path>` argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub offset: Offset,
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    pub path: PathBuf,
    /// Total length to pad the image up to. Never truncates.
    pub target_size: Option<u64>,
    pub pad_byte: u8,
}
impl Default for OutputSpec {
    fn default() -> Self {
        OutputSpec {
            path: PathBuf::from(DEFAULT_OUTPUT),
            target_size: None,
            pad_byte: DEFAULT_PAD_BYTE,
        }
    }
}

/// Caps applied while parsing and merging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    pub max_inputs: usize,
    /// Paths are cut to `path_len_max - 1` bytes.
    pub path_len_max: usize,
    /// Largest accepted single input.
    pub file_size_max: u64,
    /// Read buffer size for the copy loop.
    pub chunk_size: usize,
}
impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_inputs: FILE_MERGE_COUNTS_MAX,
            path_len_max: FILE_PATH_LENGTH_MAX,
            file_size_max: FILE_SIZE_MAX,
            chunk_size: FILE_BUFFER_SIZE,
        }
    }
}
impl Limits {
    /// Largest value accepted for `--size`.
    pub fn size_max(&self) -> u64 {
        self.file_size_max * self.max_inputs as u64
    }
}
