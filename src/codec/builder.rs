//! Elias-Fano Builder
//!
//! Encodes a non-decreasing sequence into a self-describing byte image.

use crate::error::{IndexError, Result};

use super::bits::{self, WORD_BITS};
use super::reader::{Backing, CompactIndex};
use super::{
    section_words, IndexHeader, FORMAT_VERSION, HEADER_SIZE, LONG_BLOCK_FLAG, LONG_BLOCK_SPAN,
    MAGIC, SELECT_SAMPLE_RATE,
};

/// Builder for an Elias-Fano image with a known length and upper bound
pub struct EliasFanoBuilder {
    /// Upper bound on every pushed value
    max_value: u64,
    /// Number of values the image is sized for
    count: usize,
    /// Low bits stored verbatim per value
    low_width: u8,
    /// Packed low parts
    low_bits: Vec<u64>,
    /// Unary-coded high parts
    high_bits: Vec<u64>,
    /// One entry per block of SELECT_SAMPLE_RATE set bits
    samples: Vec<u64>,
    /// Set bit positions of the block being filled
    block: Vec<u64>,
    /// Every position of each long block, in block order
    exceptions: Vec<u64>,
    /// Values pushed so far
    pushed: usize,
    /// Last pushed value
    last: u64,
}

impl EliasFanoBuilder {
    /// Size a builder for exactly `count` values in `[0, max_value]`
    pub fn new(max_value: u64, count: usize) -> Result<Self> {
        let (low_width, low_words, high_words, sample_count) =
            section_words(max_value, count as u64).ok_or_else(|| {
                IndexError::Codec(format!(
                    "{} values up to {} exceed addressable size",
                    count, max_value
                ))
            })?;

        Ok(Self {
            max_value,
            count,
            low_width,
            low_bits: vec![0u64; low_words],
            high_bits: vec![0u64; high_words],
            samples: Vec::with_capacity(sample_count),
            block: Vec::with_capacity(SELECT_SAMPLE_RATE),
            exceptions: Vec::new(),
            pushed: 0,
            last: 0,
        })
    }

    /// Append the next value (must not decrease)
    pub fn push(&mut self, value: u64) -> Result<()> {
        if self.pushed == self.count {
            return Err(IndexError::Codec(format!(
                "builder sized for {} values",
                self.count
            )));
        }
        if value > self.max_value {
            return Err(IndexError::Codec(format!(
                "value {} exceeds declared maximum {}",
                value, self.max_value
            )));
        }
        if self.pushed > 0 && value < self.last {
            return Err(IndexError::Codec(format!(
                "value {} decreases after {}",
                value, self.last
            )));
        }

        let width = self.low_width as usize;
        let i = self.pushed;

        bits::write_bits(
            &mut self.low_bits,
            i * width,
            value & bits::mask(width),
            width,
        );

        let high_pos = (value >> width) as usize + i;
        self.high_bits[high_pos / WORD_BITS] |= 1u64 << (high_pos % WORD_BITS);
        self.block.push(high_pos as u64);
        if self.block.len() == SELECT_SAMPLE_RATE {
            self.close_block();
        }

        self.pushed += 1;
        self.last = value;
        Ok(())
    }

    /// Number of values pushed so far
    pub fn pushed(&self) -> usize {
        self.pushed
    }

    /// Emit the sample for the current block, spilling a long block's
    /// positions into the exception section
    fn close_block(&mut self) {
        let (first, last) = match (self.block.first(), self.block.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return,
        };

        if last - first >= LONG_BLOCK_SPAN {
            self.samples.push(LONG_BLOCK_FLAG | self.exceptions.len() as u64);
            self.exceptions.extend_from_slice(&self.block);
        } else {
            self.samples.push(first);
        }
        self.block.clear();
    }

    /// Finish building: lay out the image and wrap it in an owned index
    pub fn finish(mut self) -> Result<CompactIndex> {
        if self.pushed != self.count {
            return Err(IndexError::Codec(format!(
                "builder sized for {} values, got {}",
                self.count, self.pushed
            )));
        }
        self.close_block();

        let words = self.low_bits.len()
            + self.high_bits.len()
            + self.samples.len()
            + self.exceptions.len();
        let mut body = Vec::with_capacity(words * bits::WORD_BYTES);
        for word in self
            .low_bits
            .iter()
            .chain(self.high_bits.iter())
            .chain(self.samples.iter())
            .chain(self.exceptions.iter())
        {
            body.extend_from_slice(&word.to_le_bytes());
        }

        let header = IndexHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            low_width: self.low_width,
            reserved0: 0,
            count: self.count as u64,
            max_value: self.max_value,
            low_words: self.low_bits.len() as u64,
            high_words: self.high_bits.len() as u64,
            sample_count: self.samples.len() as u64,
            body_crc: crc32fast::hash(&body),
            exception_words: self.exceptions.len() as u64,
            reserved: [0; 4],
        };

        let mut image = header.encode()?;
        debug_assert_eq!(image.len(), HEADER_SIZE);
        image.extend_from_slice(&body);

        CompactIndex::from_trusted(Backing::Owned(image), header)
    }
}
