//! Error types for reading insertion records.
//!
//! This module provides [RecordError] and [RecordErrorType] for reporting
//! malformed record streams together with the byte offset of the problem.

use std::error::Error;
use std::fmt;

/// Number of offending bytes shown in an error's context.
const DEFAULT_CONTEXT_LENGTH: usize = 16;

// =#========================================================================#=
// RECORD ERROR TYPE
// =#========================================================================#=
/// Error types that can occur while reading records.
#[derive(PartialEq, Debug, Clone)]
pub enum RecordErrorType {
    IoError(String),
    TruncatedRecord { expected: usize, found: usize },
    NonFiniteCoordinate,
}

// =#========================================================================#=
// RECORD ERROR
// =#========================================================================#=
/// Record error with the offset of the offending record and its leading bytes.
#[derive(Debug)]
pub struct RecordError {
    kind: RecordErrorType,
    position: usize,
    context: String,
}

impl RecordError {
    /// Create a RecordError for the record starting at `position`.
    pub fn new(kind: RecordErrorType, position: usize, bytes: &[u8]) -> Self {
        let context = bytes
            .iter()
            .take(DEFAULT_CONTEXT_LENGTH)
            .map(|byte| format!("{byte:02x}"))
            .collect::<Vec<_>>()
            .join(" ");
        Self { kind, position, context }
    }

    /// Convenience constructor for TruncatedRecord
    pub fn truncated(position: usize, expected: usize, bytes: &[u8]) -> Self {
        Self::new(RecordErrorType::TruncatedRecord { expected, found: bytes.len() }, position, bytes)
    }

    /// Convenience constructor for NonFiniteCoordinate
    pub fn non_finite(position: usize, bytes: &[u8]) -> Self {
        Self::new(RecordErrorType::NonFiniteCoordinate, position, bytes)
    }

    /// Get the error kind
    pub fn kind(&self) -> &RecordErrorType {
        &self.kind
    }

    /// Get the byte offset of the offending record
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            RecordErrorType::IoError(msg) => write!(f, "IO error - {msg}")?,
            RecordErrorType::TruncatedRecord { expected, found } => {
                write!(f, "Truncated record - expected {expected} bytes, found {found}")?
            }
            RecordErrorType::NonFiniteCoordinate => write!(f, "Record holds a non-finite coordinate")?,
        }

        write!(f, " at position {}", self.position)?;

        if !self.context.is_empty() {
            write!(f, "\n  Context (leading bytes): {}", self.context)?;
        }

        Ok(())
    }
}

impl Error for RecordError {}

impl From<std::io::Error> for RecordError {
    fn from(err: std::io::Error) -> Self {
        RecordError {
            kind: RecordErrorType::IoError(err.to_string()),
            position: 0,
            context: String::new(),
        }
    }
}
