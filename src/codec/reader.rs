//! Compact Index Reader
//!
//! Query view over an Elias-Fano image, backed either by the builder's heap
//! buffer or by a read-only memory map of a persisted file.

use std::fmt;
use std::ops::{Deref, Range};

use memmap2::Mmap;

use crate::config::LoadOptions;
use crate::error::{IndexError, Result};

use super::bits::{self, WORD_BITS, WORD_BYTES};
use super::iterator::Values;
use super::{
    section_words, IndexHeader, MonotoneSequence, FORMAT_VERSION, HEADER_SIZE, LONG_BLOCK_FLAG,
    MAGIC, SELECT_SAMPLE_RATE,
};

/// Storage behind an index image
pub enum Backing {
    /// Image produced in-process
    Owned(Vec<u8>),
    /// Image mapped read-only from disk; unmapped on drop
    Mapped(Mmap),
}

impl Deref for Backing {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        match self {
            Backing::Owned(bytes) => bytes.as_slice(),
            Backing::Mapped(mmap) => mmap.as_ref(),
        }
    }
}

/// Byte ranges of the packed sections within the image
#[derive(Debug, Clone)]
struct Layout {
    low: Range<usize>,
    high: Range<usize>,
    samples: Range<usize>,
    exceptions: Range<usize>,
}

impl Layout {
    /// Section ranges for the given word counts, `None` on overflow
    fn new(words: [usize; 4]) -> Option<Self> {
        let mut bounds = [HEADER_SIZE; 5];
        for (i, &count) in words.iter().enumerate() {
            bounds[i + 1] = bounds[i].checked_add(count.checked_mul(WORD_BYTES)?)?;
        }
        Some(Self {
            low: bounds[0]..bounds[1],
            high: bounds[1]..bounds[2],
            samples: bounds[2]..bounds[3],
            exceptions: bounds[3]..bounds[4],
        })
    }

    fn image_len(&self) -> usize {
        self.exceptions.end
    }
}

/// Immutable Elias-Fano encoded monotone sequence.
///
/// Query logic is identical for both [`Backing`] variants.
pub struct CompactIndex {
    backing: Backing,
    header: IndexHeader,
    layout: Layout,
    len: usize,
    high_words: usize,
}

impl CompactIndex {
    /// Wrap an image whose header was produced in-process
    pub(crate) fn from_trusted(backing: Backing, header: IndexHeader) -> Result<Self> {
        let layout = Layout::new([
            header.low_words as usize,
            header.high_words as usize,
            header.sample_count as usize,
            header.exception_words as usize,
        ])
        .ok_or_else(|| IndexError::Corrupt("section sizes overflow".to_string()))?;

        Ok(Self {
            backing,
            len: header.count as usize,
            high_words: header.high_words as usize,
            header,
            layout,
        })
    }

    /// Validate an image and build a query view over it without copying.
    ///
    /// Every inconsistency between the header and the bytes is reported as
    /// [`IndexError::Corrupt`] here, never later during a query. Structural
    /// checks always run; damage to the low bits or inside a block of high
    /// bits is only caught when `options.verify_checksum` is set.
    pub fn from_backing(backing: Backing, options: &LoadOptions) -> Result<Self> {
        let header = IndexHeader::decode(&backing)?;

        if header.magic != MAGIC {
            return Err(IndexError::Corrupt(format!(
                "invalid magic: expected EFOI, got {:?}",
                header.magic
            )));
        }
        if header.version != FORMAT_VERSION {
            return Err(IndexError::Corrupt(format!(
                "unsupported format version: {}",
                header.version
            )));
        }

        let (low_width, low_words, high_words, sample_count) =
            section_words(header.max_value, header.count).ok_or_else(|| {
                IndexError::Corrupt(format!(
                    "count {} with max value {} overflows",
                    header.count, header.max_value
                ))
            })?;

        if header.low_width != low_width
            || header.low_words != low_words as u64
            || header.high_words != high_words as u64
            || header.sample_count != sample_count as u64
        {
            return Err(IndexError::Corrupt(format!(
                "section sizes {:?} inconsistent with count {} and max value {}",
                (
                    header.low_width,
                    header.low_words,
                    header.high_words,
                    header.sample_count
                ),
                header.count,
                header.max_value
            )));
        }

        // Each exception word is the position of one stored value
        if header.exception_words > header.count {
            return Err(IndexError::Corrupt(format!(
                "{} exception words for {} values",
                header.exception_words, header.count
            )));
        }

        let layout = Layout::new([
            low_words,
            high_words,
            sample_count,
            header.exception_words as usize,
        ])
        .ok_or_else(|| IndexError::Corrupt("section sizes overflow".to_string()))?;
        if layout.image_len() != backing.len() {
            return Err(IndexError::Corrupt(format!(
                "implied size {} does not match file length {}",
                layout.image_len(),
                backing.len()
            )));
        }

        if options.verify_checksum {
            let actual = crc32fast::hash(&backing[HEADER_SIZE..]);
            if actual != header.body_crc {
                return Err(IndexError::Corrupt(format!(
                    "body checksum mismatch: header {:08x}, computed {:08x}",
                    header.body_crc, actual
                )));
            }
        }

        let index = Self::from_trusted(backing, header)?;
        index.validate_samples()?;

        // The last value is the declared maximum; a cheap end-to-end probe of
        // the high bits, low bits and samples together.
        if index.len > 0 {
            let last = index.select(index.len - 1)?;
            if last != header.max_value {
                return Err(IndexError::Corrupt(format!(
                    "last value {} differs from declared maximum {}",
                    last, header.max_value
                )));
            }
        }

        Ok(index)
    }

    /// First stored value
    pub fn min_value(&self) -> Option<u64> {
        self.select(0).ok()
    }

    /// Upper bound the image was sized with (the last value when non-empty)
    pub fn max_value(&self) -> u64 {
        self.header.max_value
    }

    /// Low bits stored per value
    pub fn low_width(&self) -> u8 {
        self.header.low_width
    }

    /// Whether the image lives in a memory map
    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    /// The full image, header included; identical to the persisted file
    pub fn as_bytes(&self) -> &[u8] {
        &self.backing
    }

    /// Image size in bytes
    pub fn size_in_bytes(&self) -> usize {
        self.backing.len()
    }

    /// Iterate over all values in ordinal order
    pub fn iter(&self) -> Values<'_> {
        Values::new(self)
    }

    // =========================================================================
    // Section Access (used by the iterator)
    // =========================================================================

    pub(super) fn high_section(&self) -> &[u8] {
        &self.backing[self.layout.high.clone()]
    }

    pub(super) fn high_words(&self) -> usize {
        self.high_words
    }

    pub(super) fn low_at(&self, ordinal: usize) -> u64 {
        let width = self.header.low_width as usize;
        bits::read_bits(&self.backing[self.layout.low.clone()], ordinal * width, width)
    }

    fn sample_section(&self) -> &[u8] {
        &self.backing[self.layout.samples.clone()]
    }

    fn exception_section(&self) -> &[u8] {
        &self.backing[self.layout.exceptions.clone()]
    }

    /// Check every sample against the high bits and the exception section.
    ///
    /// Reads one word per block of set bits, so it runs whether or not the
    /// checksum is verified. Each block must start at a set bit, blocks
    /// must start in increasing order, and long blocks must tile the
    /// exception section exactly.
    fn validate_samples(&self) -> Result<()> {
        let high = self.high_section();
        let high_bits = self.high_words * WORD_BITS;
        let exception_words = self.header.exception_words as usize;

        let mut used = 0usize;
        let mut previous: Option<usize> = None;

        for block in 0..self.header.sample_count as usize {
            let entry = bits::word_at(self.sample_section(), block);
            let block_len = SELECT_SAMPLE_RATE.min(self.len - block * SELECT_SAMPLE_RATE);

            let start = if entry & LONG_BLOCK_FLAG != 0 {
                let first = entry & !LONG_BLOCK_FLAG;
                if first != used as u64 || used + block_len > exception_words {
                    return Err(IndexError::Corrupt(format!(
                        "block {} points at exception word {}, expected {}",
                        block, first, used
                    )));
                }
                used += block_len;
                bits::word_at(self.exception_section(), first as usize)
            } else {
                entry
            };

            let start = usize::try_from(start)
                .ok()
                .filter(|&pos| pos < high_bits)
                .ok_or_else(|| {
                    IndexError::Corrupt(format!(
                        "block {} starts at {}, past the high bits",
                        block, start
                    ))
                })?;
            let is_set = (bits::word_at(high, start / WORD_BITS) >> (start % WORD_BITS)) & 1 == 1;
            if !is_set || previous.is_some_and(|p| start <= p) {
                return Err(IndexError::Corrupt(format!(
                    "block {} starts at {}, which is not the next set bit",
                    block, start
                )));
            }
            previous = Some(start);
        }

        if used != exception_words {
            return Err(IndexError::Corrupt(format!(
                "long blocks use {} of {} exception words",
                used, exception_words
            )));
        }
        Ok(())
    }

    /// Position of the `k`-th set bit in the high bitvector
    fn select_high(&self, k: usize) -> Result<usize> {
        let high = self.high_section();

        let sample = k / SELECT_SAMPLE_RATE;
        let mut remaining = k - sample * SELECT_SAMPLE_RATE;
        let entry = bits::word_at(self.sample_section(), sample);

        if entry & LONG_BLOCK_FLAG != 0 {
            let word = (entry & !LONG_BLOCK_FLAG) as usize + remaining;
            return Ok(bits::word_at(self.exception_section(), word) as usize);
        }

        // Short block: the answer lies within LONG_BLOCK_SPAN bits of start
        let start = entry as usize;

        let mut word_idx = start / WORD_BITS;
        if word_idx >= self.high_words {
            return Err(IndexError::Corrupt(format!(
                "select sample {} points past the high bits",
                sample
            )));
        }
        // Drop bits before the sampled position
        let mut word = bits::word_at(high, word_idx) & (u64::MAX << (start % WORD_BITS));

        loop {
            let ones = word.count_ones() as usize;
            if remaining < ones {
                return Ok(word_idx * WORD_BITS + bits::select_in_word(word, remaining));
            }
            remaining -= ones;
            word_idx += 1;
            if word_idx >= self.high_words {
                return Err(IndexError::Corrupt(format!(
                    "high bits hold fewer than {} set bits",
                    k + 1
                )));
            }
            word = bits::word_at(high, word_idx);
        }
    }
}

impl MonotoneSequence for CompactIndex {
    fn len(&self) -> usize {
        self.len
    }

    fn select(&self, ordinal: usize) -> Result<u64> {
        if self.len == 0 {
            return Err(IndexError::EmptySequence);
        }
        if ordinal >= self.len {
            return Err(IndexError::IndexOutOfBounds {
                index: ordinal,
                len: self.len,
            });
        }

        let high_pos = self.select_high(ordinal)?;
        let high = high_pos.checked_sub(ordinal).ok_or_else(|| {
            IndexError::Corrupt(format!("set bit {} found before position {}", ordinal, high_pos))
        })? as u64;
        Ok((high << self.header.low_width) | self.low_at(ordinal))
    }
}

impl PartialEq for CompactIndex {
    /// Images are a pure function of the encoded sequence
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for CompactIndex {}

impl fmt::Debug for CompactIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompactIndex")
            .field("count", &self.len)
            .field("max_value", &self.header.max_value)
            .field("low_width", &self.header.low_width)
            .field("size_in_bytes", &self.size_in_bytes())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
