use std::io::Read;
use vascular_cco::io::{
    self, BufferedRecordSource, InsertionRecord, RECORD_SIZE, RecordErrorType, RecordReader, RecordWriter,
};
use vascular_cco::model::Point;

fn sample(i: i32) -> InsertionRecord {
    let offset = f64::from(i);
    InsertionRecord {
        bifurcation: Point::new(offset, 1.0, 0.5),
        terminal: Point::new(offset + 0.25, -2.0, 0.0),
        parent_proximal: Point::new(0.0, 0.0, 0.0),
        parent_distal: Point::new(offset, 3.0, 1e-300),
        function: i - 1,
    }
}

/// Reader handing out at most seven bytes per call.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let count = buf.len().min(7).min(self.data.len() - self.pos);
        buf[..count].copy_from_slice(&self.data[self.pos..self.pos + count]);
        self.pos += count;
        Ok(count)
    }
}

#[test]
fn test_record_size() {
    assert_eq!(RECORD_SIZE, 100);
    assert_eq!(sample(0).to_bytes().len(), RECORD_SIZE);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.bin");
    let records: Vec<_> = (0..4).map(sample).collect();

    io::write_records(&path, &records).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 400);
    assert_eq!(io::read_records(&path).unwrap(), records);
}

#[test]
fn test_empty_stream() {
    assert!(RecordReader::from_bytes(Vec::new()).read_all().unwrap().is_empty());
}

#[test]
fn test_writer_counts_and_chains() {
    let mut writer = RecordWriter::new(Vec::new());
    writer.write_record(&sample(1)).unwrap().write_record(&sample(2)).unwrap();
    writer.write_records(&[sample(3)]).unwrap();
    assert_eq!(writer.count(), 3);

    let bytes = writer.finish().unwrap();
    assert_eq!(bytes.len(), 300);
    assert_eq!(&bytes[196..200], &1i32.to_le_bytes());
}

#[test]
fn test_buffered_source_assembles_short_reads() {
    let records: Vec<_> = (0..3).map(sample).collect();
    let data: Vec<u8> = records.iter().flat_map(|record| record.to_bytes()).collect();

    let reader = RecordReader::new(BufferedRecordSource::new(Trickle { data, pos: 0 }));
    let read: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
    assert_eq!(read, records);
}

#[test]
fn test_trailing_bytes_are_fatal() {
    let mut data: Vec<u8> = (0..2).flat_map(|i| sample(i).to_bytes()).collect();
    data.extend_from_slice(&[1, 2, 3]);

    let err = RecordReader::from_bytes(data).read_all().unwrap_err();
    assert_eq!(err.kind(), &RecordErrorType::TruncatedRecord { expected: 100, found: 3 });
    assert_eq!(err.position(), 200);
    assert!(err.to_string().starts_with("Truncated record"));
    assert!(err.to_string().contains("01 02 03"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = io::read_records(dir.path().join("none.bin")).unwrap_err();
    assert!(matches!(err.kind(), RecordErrorType::IoError(_)));
}
