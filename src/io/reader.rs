//! Sequential reader of insertion records.

use crate::io::record::{InsertionRecord, RECORD_SIZE};
use crate::io::record_error::RecordError;
use crate::io::record_source::{BufferedRecordSource, InMemoryRecordSource, RecordSource};
use std::fs::File;
use std::path::Path;

/// Reads [InsertionRecord]s one at a time from a [RecordSource].
///
/// Also usable as an iterator over `Result<InsertionRecord, RecordError>`;
/// iteration stops after the first error.
pub struct RecordReader<S: RecordSource> {
    source: S,
    failed: bool,
}

impl RecordReader<InMemoryRecordSource> {
    /// Creates a reader over an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(InMemoryRecordSource::from_vec(bytes))
    }
}

impl RecordReader<BufferedRecordSource<File>> {
    /// Opens a buffered reader over the file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        Ok(Self::new(BufferedRecordSource::from_file(path)?))
    }
}

impl<S: RecordSource> RecordReader<S> {
    pub fn new(source: S) -> Self {
        Self { source, failed: false }
    }

    /// Reads the next record.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The next record
    /// * `Ok(None)` - At a clean end of data
    ///
    /// # Errors
    /// [RecordError] if the data ends inside a record, a coordinate is not
    /// finite, or the source fails.
    pub fn next_record(&mut self) -> Result<Option<InsertionRecord>, RecordError> {
        let start = self.source.position();
        let mut bytes = [0u8; RECORD_SIZE];
        let count = self.source.read_chunk(&mut bytes)?;

        if count == 0 {
            return Ok(None);
        }
        if count < RECORD_SIZE {
            return Err(RecordError::truncated(start, RECORD_SIZE, &bytes[..count]));
        }

        let record = InsertionRecord::from_bytes(&bytes);
        if !record.is_finite() {
            return Err(RecordError::non_finite(start, &bytes));
        }
        Ok(Some(record))
    }

    /// Reads all remaining records; fails as a whole on the first bad record.
    pub fn read_all(mut self) -> Result<Vec<InsertionRecord>, RecordError> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }
}

impl<S: RecordSource> Iterator for RecordReader<S> {
    type Item = Result<InsertionRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.next_record();
        self.failed = next.is_err();
        next.transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::record_error::RecordErrorType;
    use crate::model::point::Point;

    fn sample(function: i32) -> InsertionRecord {
        InsertionRecord {
            bifurcation: Point::new(0.5, 1.0, -0.25),
            terminal: Point::new(2.0, 1.5, 0.0),
            parent_proximal: Point::new(0.0, 0.0, 0.0),
            parent_distal: Point::new(1.0, 2.0, -0.5),
            function,
        }
    }

    #[test]
    fn test_layout_is_little_endian() {
        let bytes = sample(7).to_bytes();
        assert_eq!(bytes.len(), 100);
        assert_eq!(&bytes[0..8], &0.5f64.to_le_bytes());
        assert_eq!(&bytes[16..24], &(-0.25f64).to_le_bytes());
        assert_eq!(&bytes[24..32], &2.0f64.to_le_bytes());
        assert_eq!(&bytes[72..80], &1.0f64.to_le_bytes());
        assert_eq!(&bytes[96..100], &7i32.to_le_bytes());
    }

    #[test]
    fn test_iterator_stops_after_truncated_record() {
        let mut bytes = sample(1).to_bytes().to_vec();
        bytes.extend_from_slice(&sample(2).to_bytes()[..40]);

        let mut reader = RecordReader::from_bytes(bytes);
        assert_eq!(reader.next().map(|r| r.ok()), Some(Some(sample(1))));
        let err = reader.next().and_then(Result::err).expect("truncated record must fail");
        assert_eq!(err.kind(), &RecordErrorType::TruncatedRecord { expected: 100, found: 40 });
        assert_eq!(err.position(), 100);
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let mut record = sample(0);
        record.terminal.y = f64::NAN;
        let err = RecordReader::from_bytes(record.to_bytes().to_vec()).read_all().unwrap_err();
        assert_eq!(err.kind(), &RecordErrorType::NonFiniteCoordinate);
        assert!(err.to_string().contains("at position 0"));
    }
}
