//! Byte sources for record reading.
//!
//! This module provides the [RecordSource] trait with an in-memory
//! ([InMemoryRecordSource]) and a buffered ([BufferedRecordSource]) implementation.

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

// =#========================================================================#=
// RECORD SOURCE (Trait)
// =#========================================================================#=
/// Sequential byte stream that [RecordReader](crate::io::RecordReader) pulls
/// fixed-size records from.
pub trait RecordSource {
    /// Fills `buffer` from the current position and advances past the bytes read.
    ///
    /// # Returns
    /// Number of bytes read; less than `buffer.len()` only at end of data.
    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize>;

    /// Returns the current byte offset.
    fn position(&self) -> usize;
}

// =#========================================================================#=
// IN MEMORY RECORD SOURCE
// =#========================================================================#=
/// An in-memory record source that owns its data.
pub struct InMemoryRecordSource {
    input: Vec<u8>,
    pos: usize,
}

impl InMemoryRecordSource {
    /// Creates a new in-memory source from a Vec of bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { input: bytes, pos: 0 }
    }
}

impl RecordSource for InMemoryRecordSource {
    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let available = &self.input[self.pos.min(self.input.len())..];
        let count = available.len().min(buffer.len());
        buffer[..count].copy_from_slice(&available[..count]);
        self.pos += count;
        Ok(count)
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }
}

// =#========================================================================#=
// BUFFERED RECORD SOURCE
// =#========================================================================#=
/// A record source streaming from any reader through a [BufReader].
pub struct BufferedRecordSource<R: Read> {
    reader: BufReader<R>,
    pos: usize,
}

impl BufferedRecordSource<File> {
    /// Opens the file at `path`.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be opened.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> BufferedRecordSource<R> {
    /// Wraps `reader` in a buffer.
    pub fn new(reader: R) -> Self {
        Self { reader: BufReader::new(reader), pos: 0 }
    }
}

impl<R: Read> RecordSource for BufferedRecordSource<R> {
    fn read_chunk(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buffer.len() {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
        self.pos += filled;
        Ok(filled)
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }
}
