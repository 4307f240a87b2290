use smallvec::SmallVec;

use crate::types::{GlyphId, WordId};
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Structure tracking, for each cell of a slot, how many of the slot's options have each glyph in
/// that cell. A cell "supports" a glyph when its count is nonzero, which lets us check a crossing
/// word against a whole domain in constant time.
pub type GlyphCountsByCell = Vec<SmallVec<[u32; MAX_GLYPH_COUNT]>>;

/// Initialize the `GlyphCountsByCell` structure for a slot with the given options. Options that
/// don't have exactly `slot_length` glyphs are skipped, since they can't occupy the slot anyway.
#[must_use]
pub fn build_glyph_counts_by_cell(
    word_list: &WordList,
    slot_length: usize,
    options: &[WordId],
) -> GlyphCountsByCell {
    let mut result: GlyphCountsByCell = (0..slot_length)
        .map(|_| (0..word_list.glyphs.len()).map(|_| 0).collect())
        .collect();

    for &word_id in options {
        let word = &word_list.words[word_id];
        if word.len() != slot_length {
            continue;
        }
        for (cell_idx, &glyph) in word.glyphs.iter().enumerate() {
            result[cell_idx][glyph] += 1;
        }
    }

    result
}

/// The glyph at the given cell of a word, if the word is long enough to have one.
#[must_use]
pub fn glyph_at(word_list: &WordList, word_id: WordId, cell_idx: usize) -> Option<GlyphId> {
    word_list.words[word_id].glyphs.get(cell_idx).copied()
}
