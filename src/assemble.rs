use std::{
    fs::File,
    io::{self, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{InputSpec, Limits, MergeError, Offset, OutputSpec};

/// Where one input ended up in the image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub offset: u64,
    pub size: u64,
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyReport {
    pub placements: Vec<Placement>,
    /// Final length of the image.
    pub len: u64,
    /// The requested size, if the content was already longer than it.
    pub target_exceeded: Option<u64>,
}

/// Writes inputs into an image one after the other, never seeking backwards.
pub struct Assembler<W> {
    out: W,
    path: PathBuf,
    cursor: u64,
    pad_byte: u8,
    buf: Vec<u8>,
    placements: Vec<Placement>,
}
impl<W: Write> Assembler<W> {
    /// `path` only labels `out` in error messages.
    pub fn new(out: W, path: impl Into<PathBuf>, pad_byte: u8, chunk_size: usize) -> Self {
        Assembler {
            out,
            path: path.into(),
            cursor: 0,
            pad_byte,
            buf: vec![0; chunk_size.max(1)],
            placements: Vec::new(),
        }
    }

    fn write_err(&self, source: io::Error) -> MergeError {
        MergeError::Write {
            path: self.path.clone(),
            source,
        }
    }

    /// Appends `count` pad bytes.
    pub fn pad(&mut self, count: u64) -> Result<(), MergeError> {
        let written = io::copy(&mut io::repeat(self.pad_byte).take(count), &mut self.out)
            .map_err(|e| self.write_err(e))?;
        self.cursor += written;
        Ok(())
    }

    /// Moves the cursor forward to `offset`, filling the gap. An address
    /// below the cursor is not honoured: writing continues at the cursor.
    fn advance_to(&mut self, offset: Offset) -> Result<u64, MergeError> {
        match offset {
            Offset::At(addr) if addr > self.cursor => {
                debug!(
                    "padding 0x{:x} bytes of 0x{:02x} up to 0x{addr:08x}",
                    addr - self.cursor,
                    self.pad_byte
                );
                self.pad(addr - self.cursor)?;
            }
            Offset::At(addr) if addr < self.cursor => {
                debug!(
                    "offset 0x{addr:08x} is below cursor 0x{:08x}, writing at cursor",
                    self.cursor
                );
            }
            _ => {}
        }
        Ok(self.cursor)
    }

    /// Copies all of `src` into the image at `input.offset`.
    pub fn place<R: Read>(
        &mut self,
        input: &InputSpec,
        src: &mut R,
    ) -> Result<Placement, MergeError> {
        let offset = self.advance_to(input.offset)?;
        let mut size = 0;

        loop {
            let n = match src.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(MergeError::Read {
                        path: input.path.clone(),
                        source,
                    })
                }
            };
            if let Err(e) = self.out.write_all(&self.buf[..n]) {
                return Err(self.write_err(e));
            }
            self.cursor += n as u64;
            size += n as u64;
        }

        debug!("copied 0x{size:x} bytes of {} at 0x{offset:08x}", input.path.display());

        let placement = Placement {
            offset,
            size,
            path: input.path.clone(),
        };
        self.placements.push(placement.clone());
        Ok(placement)
    }

    /// Pads the image up to `target_size` and flushes it. Content longer
    /// than the target is left alone and reported.
    pub fn finish(mut self, target_size: Option<u64>) -> Result<(W, AssemblyReport), MergeError> {
        let mut target_exceeded = None;

        match target_size {
            Some(target) if self.cursor <= target => self.pad(target - self.cursor)?,
            Some(target) => {
                warn!(
                    "{}: content is 0x{:x} bytes, larger than requested size 0x{target:x}",
                    self.path.display(),
                    self.cursor
                );
                target_exceeded = Some(target);
            }
            None => {}
        }

        if let Err(e) = self.out.flush() {
            return Err(self.write_err(e));
        }

        let report = AssemblyReport {
            placements: self.placements,
            len: self.cursor,
            target_exceeded,
        };
        Ok((self.out, report))
    }
}

fn input_size<R: Seek>(src: &mut R) -> io::Result<u64> {
    let size = src.seek(SeekFrom::End(0))?;
    src.rewind()?;
    Ok(size)
}

fn open_input(input: &InputSpec, limits: &Limits) -> Result<File, MergeError> {
    let path = &input.path;
    let mut file = File::open(path).map_err(|source| MergeError::OpenInput {
        path: path.clone(),
        source,
    })?;

    let size = input_size(&mut file).map_err(|source| MergeError::InputSize {
        path: path.clone(),
        source,
    })?;
    if size > limits.file_size_max {
        return Err(MergeError::FileTooLarge {
            path: path.clone(),
            size,
            max: limits.file_size_max,
        });
    }

    Ok(file)
}

fn create_output(path: &Path) -> Result<File, MergeError> {
    File::create(path).map_err(|source| MergeError::OpenOutput {
        path: path.to_owned(),
        source,
    })
}

/// Builds `output` from `inputs`, in the order given.
///
/// The first failure aborts the run and leaves whatever was written so far
/// on disk.
pub fn merge_files(
    inputs: &[InputSpec],
    output: &OutputSpec,
    limits: &Limits,
) -> Result<AssemblyReport, MergeError> {
    let out = create_output(&output.path)?;
    let mut asm = Assembler::new(out, &output.path, output.pad_byte, limits.chunk_size);

    for input in inputs {
        let mut src = open_input(input, limits)?;
        asm.place(input, &mut src)?;
    }

    let (_, report) = asm.finish(output.target_size)?;
    Ok(report)
}
