/*! Bit-Packing Codec.

Packs/unpacks 2-bit cell states into 32-bit words, 16 cells per word,
cell `k` in bits `[2k, 2k+1]` (cell 0 in the low two bits). Cells are
read/written row-major, x varying fastest. Words are serialized/parsed
big-endian by the caller ([`crate::proto`]); this module only deals in
logical `u32` words.

The reference C implementation this was distilled from wraps its bit
cursor with `bitIndex > 16` and always allocates one extra word — both
off-by-one. This module wraps at exactly 16 cells per word and sizes the
output as the true ceiling `⌈W·H·2/32⌉`.
*/

use itertools::Itertools;

use crate::cell::Cell;

const CELLS_PER_WORD: usize = 16;

/// Number of 32-bit words needed to hold `width * height` packed cells.
#[must_use]
pub fn words_for(width: u32, height: u32) -> usize {
    let bits = (width as u64) * (height as u64) * 2;
    bits.div_ceil(32) as usize
}

/// Pack a row-major (x fastest) sequence of cells into 32-bit words,
/// zero-filling unused high bits of the final word.
#[must_use]
pub fn pack(cells: &[Cell]) -> Vec<u32> {
    cells
        .iter()
        .chunks(CELLS_PER_WORD)
        .into_iter()
        .map(|chunk| {
            chunk
                .enumerate()
                .fold(0u32, |word, (k, cell)| word | (u32::from(cell.to_bits()) << (2 * k)))
        })
        .collect()
}

/// Unpack `count` cells (row-major, x fastest) from packed words.
///
/// The bit cursor is re-zeroed at the start of `words`, independent of any
/// other message: consecutive rectangles in the wire protocol each start a
/// fresh word boundary.
///
/// # Errors
///
/// Returns [`crate::Error::Codec`] if `words` is shorter than
/// `words_for(count, 1)` would require to hold `count` cells.
pub fn unpack(words: &[u32], count: usize) -> Result<Vec<Cell>, crate::Error> {
    let needed = count.div_ceil(CELLS_PER_WORD);
    if words.len() < needed {
        return Err(crate::Error::codec(format!(
            "unpack: need {needed} words for {count} cells, got {}",
            words.len()
        )));
    }
    Ok((0..count)
        .map(|i| {
            let word = words[i / CELLS_PER_WORD];
            let shift = 2 * (i % CELLS_PER_WORD);
            Cell::from_bits(((word >> shift) & 0x3) as u8)
        })
        .collect())
}
