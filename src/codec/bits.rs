//! Word-level bit helpers shared by the codec builder, reader and iterator.
//!
//! All packed sections are little-endian `u64` words. Readers work directly
//! on byte slices so the same code serves heap images and memory maps.

/// Bits per packed word
pub(crate) const WORD_BITS: usize = 64;

/// Bytes per packed word
pub(crate) const WORD_BYTES: usize = 8;

/// Number of low bits stored verbatim per value.
///
/// `floor(log2(max_value / count))`, or 0 when the ratio is below 1.
pub(crate) fn low_width(max_value: u64, count: u64) -> u8 {
    if count == 0 {
        return 0;
    }
    let ratio = max_value / count;
    if ratio == 0 {
        0
    } else {
        (63 - ratio.leading_zeros()) as u8
    }
}

/// Mask selecting the lowest `width` bits
#[inline]
pub(crate) fn mask(width: usize) -> u64 {
    if width >= WORD_BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Read the `word`-th little-endian word of a section.
///
/// Callers bound-check against the section length.
#[inline]
pub(crate) fn word_at(section: &[u8], word: usize) -> u64 {
    let start = word * WORD_BYTES;
    let mut buf = [0u8; WORD_BYTES];
    buf.copy_from_slice(&section[start..start + WORD_BYTES]);
    u64::from_le_bytes(buf)
}

/// OR `value` (already masked to `width` bits) into `words` at bit `pos`
pub(crate) fn write_bits(words: &mut [u64], pos: usize, value: u64, width: usize) {
    if width == 0 {
        return;
    }
    let idx = pos / WORD_BITS;
    let shift = pos % WORD_BITS;

    words[idx] |= value << shift;

    // Spill into the next word
    if shift + width > WORD_BITS {
        words[idx + 1] |= value >> (WORD_BITS - shift);
    }
}

/// Read `width` bits starting at bit `pos` of a packed section
#[inline]
pub(crate) fn read_bits(section: &[u8], pos: usize, width: usize) -> u64 {
    if width == 0 {
        return 0;
    }
    let idx = pos / WORD_BITS;
    let shift = pos % WORD_BITS;

    let mut value = word_at(section, idx) >> shift;
    if shift + width > WORD_BITS {
        value |= word_at(section, idx + 1) << (WORD_BITS - shift);
    }
    value & mask(width)
}

/// Position of the `k`-th (0-based) set bit inside `word`.
///
/// Returns 64 when `word` has `k` or fewer set bits.
#[inline]
pub(crate) fn select_in_word(word: u64, k: usize) -> usize {
    let mut w = word;
    for _ in 0..k {
        if w == 0 {
            return WORD_BITS;
        }
        // Clear lowest set bit
        w &= w - 1;
    }
    if w == 0 {
        WORD_BITS
    } else {
        w.trailing_zeros() as usize
    }
}
