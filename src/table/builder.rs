//! Offsets Builder
//!
//! Collects record offsets during a single forward scan.

use crate::codec::EliasFanoBuilder;
use crate::error::{IndexError, Result};

use super::OffsetsTable;

/// Accumulates strictly increasing offsets before encoding.
///
/// `finish` consumes the builder, so no offset can be pushed afterwards.
#[derive(Debug, Default, Clone)]
pub struct OffsetsBuilder {
    offsets: Vec<u32>,
}

impl OffsetsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size for a known number of records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: Vec::with_capacity(capacity),
        }
    }

    /// Append the next record offset.
    ///
    /// Rejects offsets not strictly greater than the last one; the builder
    /// is left unchanged in that case.
    pub fn push_offset(&mut self, offset: u32) -> Result<()> {
        if let Some(&previous) = self.offsets.last() {
            if offset <= previous {
                return Err(IndexError::OrderViolation { previous, offset });
            }
        }
        self.offsets.push(offset);
        Ok(())
    }

    /// Number of offsets pushed so far
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Largest offset pushed so far
    pub fn last(&self) -> Option<u32> {
        self.offsets.last().copied()
    }

    /// Offsets in push order
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Freeze the sequence and encode it into an in-memory table
    pub fn finish(self) -> Result<OffsetsTable> {
        let max_value = self.last().unwrap_or(0) as u64;

        let mut encoder = EliasFanoBuilder::new(max_value, self.offsets.len())?;
        for &offset in &self.offsets {
            encoder.push(offset as u64)?;
        }

        Ok(OffsetsTable::from_index(encoder.finish()?))
    }
}
