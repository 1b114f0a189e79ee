use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Illegal or unrecognized size option: {0:?}")]
    InvalidSize(String),

    #[error("Illegal or unrecognized pad byte option: {0:?}")]
    InvalidPad(String),

    #[error("Illegal or unrecognized offset option: {0:?}")]
    InvalidOffset(String),

    #[error("Too many input files: at most {max} are supported")]
    TooManyInputs { max: usize },

    #[error("Can not open output file: {}: {source}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can not open input file: {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can not determine size of input file: {}: {source}", path.display())]
    InputSize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("File too big: {} ({size} bytes, limit is {max})", path.display())]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Can not read input file: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Can not write output file: {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
