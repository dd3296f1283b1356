//! Error types for offsetidx
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using IndexError
pub type Result<T> = std::result::Result<T, IndexError>;

/// Unified error type for offsetidx operations
#[derive(Debug, Error)]
pub enum IndexError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index file not found: {}", .0.display())]
    NotFound(PathBuf),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt index: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record offset {0} does not fit in 32 bits")]
    OffsetOverflow(u64),

    // -------------------------------------------------------------------------
    // Caller Contract Violations
    // -------------------------------------------------------------------------
    #[error("Offsets must be strictly increasing: pushed {offset} after {previous}")]
    OrderViolation { previous: u32, offset: u32 },

    #[error("Index {index} out of bounds for table of {len} entries")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Value {value} outside stored range [{min}, {max}]")]
    ValueOutOfRange { value: u64, min: u64, max: u64 },

    #[error("Offset {0} is not a recorded offset")]
    OffsetNotFound(u32),

    #[error("Query on an empty sequence")]
    EmptySequence,

    #[error("Codec error: {0}")]
    Codec(String),
}

impl IndexError {
    /// Whether rebuilding the index from its companion data would cure this error.
    pub fn is_rebuildable(&self) -> bool {
        matches!(self, IndexError::NotFound(_) | IndexError::Corrupt(_))
    }
}

impl From<bincode::Error> for IndexError {
    fn from(e: bincode::Error) -> Self {
        IndexError::Serialization(e.to_string())
    }
}
