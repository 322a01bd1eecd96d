//! Binary insertion records, the input of [TreeMerger](crate::merge::TreeMerger).
//!
//! A record stream is a flat sequence of fixed-size records without header:
//!
//! | Bytes | Content |
//! |-------|---------|
//! | 0..24 | bifurcation point (3 x f64) |
//! | 24..48 | new terminal point (3 x f64) |
//! | 48..72 | former parent's proximal point (3 x f64) |
//! | 72..96 | former parent's distal point (3 x f64) |
//! | 96..100 | functional tag (i32) |
//!
//! All values are little-endian. A stream ending inside a record, or a record
//! holding non-finite coordinates, is rejected with a [RecordError].
//!
//! # Example
//! ```
//! use vascular_cco::io::{InsertionRecord, RecordReader, RecordWriter};
//! use vascular_cco::model::Point;
//!
//! let record = InsertionRecord {
//!     bifurcation: Point::new(0.0, 1.0, 0.0),
//!     terminal: Point::new(1.0, 1.0, 0.0),
//!     parent_proximal: Point::new(0.0, 0.0, 0.0),
//!     parent_distal: Point::new(0.0, 2.0, 0.0),
//!     function: 0,
//! };
//! let mut writer = RecordWriter::new(Vec::new());
//! writer.write_record(&record)?;
//! let bytes = writer.finish()?;
//!
//! let records = RecordReader::from_bytes(bytes).read_all()?;
//! assert_eq!(records, vec![record]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod reader;
pub mod record;
pub mod record_error;
pub mod record_source;
pub mod writer;

pub use reader::RecordReader;
pub use record::{InsertionRecord, RECORD_SIZE};
pub use record_error::{RecordError, RecordErrorType};
pub use record_source::{BufferedRecordSource, InMemoryRecordSource, RecordSource};
pub use writer::RecordWriter;

use std::fs::File;
use std::path::Path;

// ============================================================================
// Quick API
// ============================================================================
/// Reads all records of a file.
///
/// # Errors
/// [RecordError] if the file cannot be read or holds a malformed record.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<InsertionRecord>, RecordError> {
    RecordReader::new(BufferedRecordSource::from_file(path)?).read_all()
}

/// Writes all records to a new file, replacing an existing one.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[InsertionRecord]) -> std::io::Result<()> {
    let mut writer = RecordWriter::new(File::create(path)?);
    writer.write_records(records)?;
    writer.finish()?;
    Ok(())
}
