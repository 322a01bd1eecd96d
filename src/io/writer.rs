//! Writer for insertion records.

use crate::io::record::InsertionRecord;
use std::io::{self, BufWriter, Write};

/// Appends encoded [InsertionRecord]s to any writer through a [BufWriter].
pub struct RecordWriter<W: Write> {
    writer: BufWriter<W>,
    count: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer: BufWriter::new(writer), count: 0 }
    }

    // ============================================================================
    // API (public)
    // ============================================================================
    /// Writes one record.
    pub fn write_record(&mut self, record: &InsertionRecord) -> io::Result<&mut Self> {
        self.writer.write_all(&record.to_bytes())?;
        self.count += 1;
        Ok(self)
    }

    /// Writes all `records` in order.
    pub fn write_records(&mut self, records: &[InsertionRecord]) -> io::Result<&mut Self> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(self)
    }

    /// Returns the number of records written so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Flushes the buffer and returns the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }
}
