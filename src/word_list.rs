use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::fmt::Debug;
use std::fs;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use crate::types::{GlyphId, WordId};
use crate::{MAX_GLYPH_COUNT, MAX_SLOT_LENGTH};

/// Stop collecting errors for a source after this many, since a file that's this broken is
/// probably not a word list at all.
const MAX_ERRORS_PER_SOURCE: usize = 100;

/// A struct representing a word in the word list.
#[derive(Debug, Clone)]
pub struct Word {
    /// The word as it would appear in a grid: uppercase, NFC-normalized, no whitespace.
    pub normalized_string: String,

    /// The glyph ids making up `normalized_string`.
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of glyphs in the word, which is what slot lengths are compared against.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Given a canonical word string from a word list file, turn it into the normalized form we'll
/// use in the actual fill engine.
#[must_use]
pub fn normalize_word(canonical: &str) -> String {
    canonical
        .nfc() // Normalize Unicode combining forms
        .flat_map(char::to_uppercase)
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WordListError {
    #[error("Can’t read file: “{0}”")]
    InvalidPath(String),

    #[error("Word list contains invalid word: “{0}”")]
    InvalidWord(String),
}

/// Configuration describing a source of word list entries.
pub enum WordListSourceConfig {
    Memory { id: String, words: Vec<String> },
    File { id: String, path: OsString },
    FileContents { id: String, contents: &'static str },
}

impl WordListSourceConfig {
    /// The unique, persistent id of this word list.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            WordListSourceConfig::Memory { id, .. }
            | WordListSourceConfig::FileContents { id, .. }
            | WordListSourceConfig::File { id, .. } => id.clone(),
        }
    }
}

#[derive(Debug)]
pub struct WordListSourceState {
    pub id: String,
    pub errors: Vec<WordListError>,
}

/// Parse the contents of a word list file into normalized entries, recording any invalid lines.
fn parse_word_list_file_contents(
    file_contents: &str,
    errors: &mut Vec<WordListError>,
) -> Vec<String> {
    file_contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map_while(|line| {
            if errors.len() > MAX_ERRORS_PER_SOURCE {
                return None;
            }

            // Scored lists look like `word;50`; we only care about the word.
            let canonical = line.split(';').next().unwrap_or_default();
            let normalized = normalize_word(canonical);
            if normalized.is_empty() {
                errors.push(WordListError::InvalidWord(line.into()));
                return Some(None);
            }

            Some(Some(normalized))
        })
        .flatten()
        .collect()
}

fn load_words_from_source(source: &WordListSourceConfig) -> (Vec<String>, WordListSourceState) {
    let id = source.id();
    let mut errors = vec![];

    let entries = match source {
        WordListSourceConfig::Memory { words, .. } => words
            .iter()
            .filter_map(|canonical| {
                let normalized = normalize_word(canonical);
                if normalized.is_empty() {
                    errors.push(WordListError::InvalidWord(canonical.clone()));
                    return None;
                }

                Some(normalized)
            })
            .collect(),

        WordListSourceConfig::File { path, .. } => {
            if let Ok(contents) = fs::read_to_string(path) {
                parse_word_list_file_contents(&contents, &mut errors)
            } else {
                errors.push(WordListError::InvalidPath(path.to_string_lossy().into()));
                vec![]
            }
        }

        WordListSourceConfig::FileContents { contents, .. } => {
            parse_word_list_file_contents(contents, &mut errors)
        }
    };

    (entries, WordListSourceState { id, errors })
}

/// A struct representing the loaded vocabulary. This is static for the lifetime of a fill: every
/// slot's domain starts out as the full set of `WordId`s and only shrinks from there.
pub struct WordList {
    /// A list of all characters that occur in any (normalized) word. `GlyphId`s used everywhere
    /// else are indices into this list.
    pub glyphs: SmallVec<[char; MAX_GLYPH_COUNT]>,

    /// The inverse of `glyphs`: a map from a character to the `GlyphId` representing it.
    pub glyph_id_by_char: HashMap<char, GlyphId>,

    /// All loaded words, in load order. A `WordId` is an index into this list.
    pub words: Vec<Word>,

    /// A map from a normalized string to the id of the Word representing it.
    pub word_id_by_string: HashMap<String, WordId>,

    /// The maximum word length provided when configuring the WordList, if any.
    pub max_length: Option<usize>,

    /// The state of each word list source, keyed by source id.
    pub source_states: HashMap<String, WordListSourceState>,
}

impl WordList {
    /// Construct a new `WordList` using the given sources (omitting any entries that are longer than
    /// `max_length`).
    #[must_use]
    pub fn new(source_configs: &[WordListSourceConfig], max_length: Option<usize>) -> WordList {
        let mut instance = WordList {
            glyphs: smallvec![],
            glyph_id_by_char: HashMap::new(),
            words: vec![],
            word_id_by_string: HashMap::new(),
            max_length,
            source_states: HashMap::new(),
        };

        for source in source_configs {
            let (entries, source_state) = load_words_from_source(source);
            for normalized in entries {
                if max_length.map_or(false, |max| normalized.chars().count() > max) {
                    continue;
                }
                if instance.word_id_by_string.contains_key(&normalized) {
                    continue;
                }
                instance.add_word(normalized);
            }
            instance
                .source_states
                .insert(source_state.id.clone(), source_state);
        }

        instance
    }

    /// Convenience constructor for a single in-memory list of words.
    #[must_use]
    pub fn from_words(words: &[&str]) -> WordList {
        WordList::new(
            &[WordListSourceConfig::Memory {
                id: "0".into(),
                words: words.iter().map(|&word| word.to_string()).collect(),
            }],
            None,
        )
    }

    /// Add the given word to the list. The word must not be part of the list yet.
    fn add_word(&mut self, normalized: String) -> WordId {
        let glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]> = normalized
            .chars()
            .map(|c| self.glyph_id_for_char(c))
            .collect();

        let word_id = self.words.len();

        self.word_id_by_string.insert(normalized.clone(), word_id);
        self.words.push(Word {
            normalized_string: normalized,
            glyphs,
        });

        word_id
    }

    /// What's the unique glyph id for the given char? We do this lazily, instead of just mapping
    /// every letter up front, because word list entries may also contain numbers, non-English
    /// letters, or punctuation.
    pub fn glyph_id_for_char(&mut self, ch: char) -> GlyphId {
        self.glyph_id_by_char.get(&ch).copied().unwrap_or_else(|| {
            self.glyphs.push(ch);
            let id = self.glyphs.len() - 1;
            self.glyph_id_by_char.insert(ch, id);
            id
        })
    }

    /// Look up the id of a normalized word, if it's in the list.
    #[must_use]
    pub fn word_id(&self, normalized_word: &str) -> Option<WordId> {
        self.word_id_by_string.get(normalized_word).copied()
    }

    /// The normalized string for the given word.
    #[must_use]
    pub fn word_str(&self, word_id: WordId) -> &str {
        &self.words[word_id].normalized_string
    }

    /// The number of words in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Errors for each source, keyed by source id.
    #[must_use]
    pub fn get_source_errors(&self) -> HashMap<String, Vec<WordListError>> {
        self.source_states
            .iter()
            .map(|(id, state)| (id.clone(), state.errors.clone()))
            .collect()
    }
}

impl Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("glyphs", &self.glyphs)
            .field("words", &self.words.len())
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod tests {
    use crate::word_list::{normalize_word, WordList, WordListError, WordListSourceConfig};
    use std::path;
    use std::path::PathBuf;

    #[must_use]
    pub fn resource_path(name: &str) -> PathBuf {
        let mut path = path::PathBuf::from(file!());
        path.pop();
        path.pop();
        path.push("resources");
        path.push(name);
        path
    }

    #[test]
    fn test_normalize_word() {
        assert_eq!(normalize_word("cat"), "CAT");
        assert_eq!(normalize_word(" ice cream "), "ICECREAM");
        assert_eq!(normalize_word("\t"), "");
    }

    #[test]
    fn test_loads_words_from_file() {
        let word_list = WordList::new(
            &[WordListSourceConfig::File {
                id: "0".into(),
                path: resource_path("words0.txt").into(),
            }],
            None,
        );

        assert!(word_list.get_source_errors()["0"].is_empty());
        assert_eq!(word_list.len(), 10);

        let word_id = word_list
            .word_id("SEVEN")
            .expect("word list should include 'SEVEN'");
        assert_eq!(word_list.word_str(word_id), "SEVEN");
        assert_eq!(word_list.words[word_id].len(), 5);
    }

    #[test]
    fn test_skips_words_over_max_length() {
        let word_list = WordList::new(
            &[WordListSourceConfig::FileContents {
                id: "0".into(),
                contents: "one\nthree\nfour\n",
            }],
            Some(4),
        );

        assert_eq!(word_list.len(), 2);
        assert!(word_list.word_id("THREE").is_none());
        assert!(word_list.word_id("FOUR").is_some());
    }

    #[test]
    fn test_scored_entries_and_duplicates() {
        let word_list = WordList::new(
            &[
                WordListSourceConfig::FileContents {
                    id: "0".into(),
                    contents: "cat;50\nCat;10\n\ndog;20\n;30\n",
                },
                WordListSourceConfig::Memory {
                    id: "1".into(),
                    words: vec!["DOG".into(), "emu".into()],
                },
            ],
            None,
        );

        assert_eq!(
            word_list
                .words
                .iter()
                .map(|word| word.normalized_string.as_str())
                .collect::<Vec<_>>(),
            vec!["CAT", "DOG", "EMU"]
        );
        assert_eq!(
            word_list.get_source_errors()["0"],
            vec![WordListError::InvalidWord(";30".into())]
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let word_list = WordList::new(
            &[WordListSourceConfig::File {
                id: "0".into(),
                path: resource_path("does-not-exist.txt").into(),
            }],
            None,
        );

        assert!(word_list.is_empty());
        assert!(matches!(
            word_list.get_source_errors()["0"][..],
            [WordListError::InvalidPath(_)]
        ));
    }

    #[test]
    fn test_unusual_characters() {
        let word_list = WordList::from_words(&[
            // Non-English character expressed as one two-byte `char`
            "monsutâ",
            // Non-English character expressed as two chars w/ combining form
            "he\u{301}len",
        ]);

        assert_eq!(
            word_list.words.iter().map(|word| word.len()).collect::<Vec<_>>(),
            vec![7, 5]
        );
        assert!(word_list.word_id("HÉLEN").is_some());
    }
}
