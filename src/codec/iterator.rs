//! Compact Index Iterator
//!
//! Sequential decode of every value without a select per element.

use super::bits::{self, WORD_BITS};
use super::reader::CompactIndex;
use super::MonotoneSequence;

/// Iterator over the values of a [`CompactIndex`] in ordinal order
pub struct Values<'a> {
    index: &'a CompactIndex,
    /// Ordinal of the next value
    ordinal: usize,
    /// Index of the current high word
    word_idx: usize,
    /// Unvisited set bits of the current high word
    word: u64,
}

impl<'a> Values<'a> {
    pub(super) fn new(index: &'a CompactIndex) -> Self {
        let word = if index.high_words() > 0 {
            bits::word_at(index.high_section(), 0)
        } else {
            0
        };
        Self {
            index,
            ordinal: 0,
            word_idx: 0,
            word,
        }
    }
}

impl Iterator for Values<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ordinal >= self.index.len() {
            return None;
        }

        while self.word == 0 {
            self.word_idx += 1;
            if self.word_idx >= self.index.high_words() {
                return None;
            }
            self.word = bits::word_at(self.index.high_section(), self.word_idx);
        }

        let high_pos = self.word_idx * WORD_BITS + self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;

        let high = high_pos.checked_sub(self.ordinal)? as u64;
        let value = (high << self.index.low_width()) | self.index.low_at(self.ordinal);
        self.ordinal += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.len() - self.ordinal;
        (remaining, Some(remaining))
    }
}
