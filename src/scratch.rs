//! Scratch file for stream payloads.
//!
//! Stream payloads are spilled out of memory into a random-access temp
//! file owned by the document. Writers receive a [`StreamSpan`] describing
//! where their bytes landed; readers open a bounded [`ScratchReader`] over
//! a span. The temp file is unlinked by the OS when the [`ScratchFile`] is
//! dropped, which happens on document close.

use crate::error::Result;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Copy buffer size used when spooling payloads between scratch files.
const COPY_BUFFER_SIZE: usize = 10 * 1024;

/// Location of a stream payload inside the scratch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSpan {
    /// Byte offset of the payload in the scratch file
    pub offset: u64,
    /// Payload length in bytes
    pub length: u64,
}

/// A random-access temp file acting as an append-only arena.
///
/// Exclusively owned by one document; all stream handles of that document
/// borrow from it. Dropping the scratch file deletes the backing temp file.
#[derive(Debug)]
pub struct ScratchFile {
    file: File,
    len: u64,
}

impl ScratchFile {
    /// Create a scratch file in the system temp directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            file: tempfile::tempfile()?,
            len: 0,
        })
    }

    /// Create a scratch file in a specific directory.
    pub fn in_directory(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: tempfile::tempfile_in(dir)?,
            len: 0,
        })
    }

    /// Number of payload bytes written so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a payload and return its span.
    pub fn write(&mut self, data: &[u8]) -> Result<StreamSpan> {
        let offset = self.len;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        self.len += data.len() as u64;
        Ok(StreamSpan {
            offset,
            length: data.len() as u64,
        })
    }

    /// Append everything a reader yields, copying through a 10 KiB buffer,
    /// and return the span of the copied bytes.
    pub fn write_from(&mut self, reader: &mut impl Read) -> Result<StreamSpan> {
        let offset = self.len;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; COPY_BUFFER_SIZE];
        let mut copied: u64 = 0;
        loop {
            let amount = reader.read(&mut buf)?;
            if amount == 0 {
                break;
            }
            self.file.write_all(&buf[..amount])?;
            copied += amount as u64;
        }
        self.len += copied;
        Ok(StreamSpan {
            offset,
            length: copied,
        })
    }

    /// Read a span's payload into a fresh buffer.
    pub fn read(&mut self, span: StreamSpan) -> Result<Vec<u8>> {
        let mut data = vec![0u8; span.length as usize];
        self.file.seek(SeekFrom::Start(span.offset))?;
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Open a bounded reader over a span.
    ///
    /// The reader borrows the scratch file for the duration of the read.
    pub fn reader(&mut self, span: StreamSpan) -> Result<ScratchReader<'_>> {
        self.file.seek(SeekFrom::Start(span.offset))?;
        Ok(ScratchReader {
            file: &mut self.file,
            remaining: span.length,
        })
    }
}

/// A bounded [`Read`] over one span of the scratch file.
#[derive(Debug)]
pub struct ScratchReader<'a> {
    file: &'a mut File,
    remaining: u64,
}

impl Read for ScratchReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let cap = buf.len().min(self.remaining as usize);
        let amount = self.file.read(&mut buf[..cap])?;
        self.remaining -= amount as u64;
        Ok(amount)
    }
}
