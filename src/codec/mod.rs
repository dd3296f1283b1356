//! Codec Module
//!
//! Elias-Fano encoding of monotone integer sequences.
//!
//! Each value is split into `low_width` low bits, stored verbatim in a packed
//! array, and the remaining high bits, stored in unary: the value at ordinal
//! `i` sets bit `(value >> low_width) + i` of the high bitvector.
//!
//! Set bits are grouped in blocks of 256. A block spanning fewer than 2^16
//! high bits stores its first position as a sample and `select` scans from
//! there, touching at most 1024 words. A longer block stores all of its
//! positions in the exception section; its sample carries the top bit and
//! the word index of its first position there.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header (64 bytes, bincode fixed-int LE)                     │
//! │   Magic: "EFOI" (4) | Version: u16 (2) | LowWidth: u8 (1)   │
//! │   Reserved (1) | Count: u64 | MaxValue: u64                 │
//! │   LowWords: u64 | HighWords: u64 | SampleCount: u64         │
//! │   BodyCRC: u32 | ExceptionWords: u64 | Reserved (4)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Low bits     LowWords    × u64 LE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │ High bits    HighWords   × u64 LE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Samples      SampleCount × u64 LE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Exceptions   ExceptionWords × u64 LE                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The heap image produced by [`EliasFanoBuilder`] and the persisted file are
//! the same bytes, so saving is a plain write and loading is a plain map.

pub(crate) mod bits;
mod builder;
mod iterator;
mod reader;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

pub use builder::EliasFanoBuilder;
pub use iterator::Values;
pub use reader::{Backing, CompactIndex};

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Magic bytes identifying an offsets index image
pub(crate) const MAGIC: [u8; 4] = *b"EFOI";

/// Current image format version
pub(crate) const FORMAT_VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 64;

/// One select sample per this many set bits of the high bitvector
pub(crate) const SELECT_SAMPLE_RATE: usize = 256;

/// Blocks spanning at least this many high bits store every position
pub(crate) const LONG_BLOCK_SPAN: u64 = 1 << 16;

/// Sample flag marking a block whose positions live in the exception section
pub(crate) const LONG_BLOCK_FLAG: u64 = 1 << 63;

// =============================================================================
// Header
// =============================================================================

/// Fixed-size image header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct IndexHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub low_width: u8,
    pub reserved0: u8,
    pub count: u64,
    pub max_value: u64,
    pub low_words: u64,
    pub high_words: u64,
    pub sample_count: u64,
    pub body_crc: u32,
    pub exception_words: u64,
    pub reserved: [u8; 4],
}

impl IndexHeader {
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        if bytes.len() != HEADER_SIZE {
            return Err(IndexError::Serialization(format!(
                "header encoded to {} bytes, expected {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }
        Ok(bytes)
    }

    pub(crate) fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(IndexError::Corrupt(format!(
                "truncated header: {} bytes",
                bytes.len()
            )));
        }
        Ok(bincode::deserialize(&bytes[..HEADER_SIZE])?)
    }
}

/// Section sizes implied by `count` and `max_value`.
///
/// The exception section depends on the data and is sized by the header.
/// Returns `(low_width, low_words, high_words, sample_count)`, or `None` when
/// the parameters overflow the address space.
pub(crate) fn section_words(max_value: u64, count: u64) -> Option<(u8, usize, usize, usize)> {
    let low_width = bits::low_width(max_value, count);
    let count = usize::try_from(count).ok()?;

    let low_bits = count.checked_mul(low_width as usize)?;
    let high_len = count
        .checked_add(usize::try_from(max_value >> low_width).ok()?)?
        .checked_add(1)?;

    Some((
        low_width,
        low_bits.div_ceil(bits::WORD_BITS),
        high_len.div_ceil(bits::WORD_BITS),
        count.div_ceil(SELECT_SAMPLE_RATE),
    ))
}

// =============================================================================
// Query Trait
// =============================================================================

/// Read-only access to a monotone sequence by ordinal.
///
/// Implementors supply `len` and `select`; `predecessor_index` falls back to
/// a binary search over `select`.
pub trait MonotoneSequence {
    /// Number of stored values
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `ordinal`
    fn select(&self, ordinal: usize) -> Result<u64>;

    /// Largest ordinal whose value is `<= value`.
    ///
    /// `value` must lie within `[select(0), select(len - 1)]`.
    fn predecessor_index(&self, value: u64) -> Result<usize> {
        let len = self.len();
        if len == 0 {
            return Err(IndexError::EmptySequence);
        }

        let min = self.select(0)?;
        let max = self.select(len - 1)?;
        if value < min || value > max {
            return Err(IndexError::ValueOutOfRange { value, min, max });
        }

        // Invariant: select(left) <= value < select(right) (right may be len)
        let (mut left, mut right) = (0usize, len);
        while left + 1 < right {
            let middle = left + (right - left) / 2;
            if self.select(middle)? <= value {
                left = middle;
            } else {
                right = middle;
            }
        }
        Ok(left)
    }
}

/// Encode a non-decreasing sequence whose values do not exceed `max_value`
pub fn encode(values: &[u64], max_value: u64) -> Result<CompactIndex> {
    let mut builder = EliasFanoBuilder::new(max_value, values.len())?;
    for &value in values {
        builder.push(value)?;
    }
    builder.finish()
}
