//! The insertion record and its fixed-size byte layout.

use crate::model::point::Point;
use crate::model::vessel::FunctionTag;

/// Size of one encoded record in bytes: 12 coordinates and a tag.
pub const RECORD_SIZE: usize = 12 * 8 + 4;

const TAG_OFFSET: usize = 12 * 8;

/// One recorded terminal insertion.
///
/// The former parent's endpoints identify the vessel that was split; they
/// are matched bit-exactly against the vessels of the tree the record is
/// applied to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsertionRecord {
    pub bifurcation: Point,
    pub terminal: Point,
    pub parent_proximal: Point,
    pub parent_distal: Point,
    pub function: FunctionTag,
}

impl InsertionRecord {
    /// Encodes the record, little-endian.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        for (slot, value) in self.coordinates().iter().enumerate() {
            bytes[slot * 8..(slot + 1) * 8].copy_from_slice(&value.to_le_bytes());
        }
        bytes[TAG_OFFSET..].copy_from_slice(&self.function.to_le_bytes());
        bytes
    }

    /// Decodes a record, little-endian. Coordinates are not validated.
    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let value = |slot: usize| {
            let mut chunk = [0u8; 8];
            chunk.copy_from_slice(&bytes[slot * 8..(slot + 1) * 8]);
            f64::from_le_bytes(chunk)
        };
        let point = |first: usize| Point::new(value(first), value(first + 1), value(first + 2));

        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[TAG_OFFSET..]);

        InsertionRecord {
            bifurcation: point(0),
            terminal: point(3),
            parent_proximal: point(6),
            parent_distal: point(9),
            function: FunctionTag::from_le_bytes(tag),
        }
    }

    /// Returns whether all twelve coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.coordinates().iter().all(|value| value.is_finite())
    }

    fn coordinates(&self) -> [f64; 12] {
        let [a, b, c, d] = [self.bifurcation, self.terminal, self.parent_proximal, self.parent_distal].map(|point| point.to_array());
        [a[0], a[1], a[2], b[0], b[1], b[2], c[0], c[1], c[2], d[0], d[1], d[2]]
    }
}
