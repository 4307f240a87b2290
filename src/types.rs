/// An identifier for a given letter or symbol, based on its index in the `WordList`'s `glyphs`
/// field.
pub type GlyphId = usize;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field. Unlike
/// slot options in a length-bucketed list, these are unique across all lengths, since every slot
/// starts out with the entire vocabulary as its domain.
pub type WordId = usize;
