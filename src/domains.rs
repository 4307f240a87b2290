//! The domain store: for each slot, the words that are still candidates for it. Domains only ever
//! shrink, and only the consistency engine shrinks them; search reads them but never writes.

use crate::grid_config::SlotId;
use crate::types::WordId;

/// Candidate words for every slot, indexed by `SlotId`. Each domain is kept in ascending `WordId`
/// order (i.e. word list order), which makes iteration over it deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<Vec<WordId>>,
}

impl Domains {
    /// Give each of `slot_count` slots the entire vocabulary of `word_count` words.
    #[must_use]
    pub fn new(slot_count: usize, word_count: usize) -> Domains {
        Domains {
            options: (0..slot_count).map(|_| (0..word_count).collect()).collect(),
        }
    }

    /// Build a store from explicit per-slot option lists.
    #[must_use]
    pub fn from_options(mut options: Vec<Vec<WordId>>) -> Domains {
        for slot_options in &mut options {
            slot_options.sort_unstable();
            slot_options.dedup();
        }
        Domains { options }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.options.len()
    }

    /// The current candidates for a slot.
    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> &[WordId] {
        &self.options[slot_id]
    }

    #[must_use]
    pub fn len(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    #[must_use]
    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.options[slot_id].is_empty()
    }

    #[must_use]
    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.options[slot_id].binary_search(&word_id).is_ok()
    }

    /// The id of the first slot whose domain is empty, if any.
    #[must_use]
    pub fn first_empty(&self) -> Option<SlotId> {
        self.options.iter().position(Vec::is_empty)
    }

    /// Keep only the candidates for a slot that satisfy the predicate, returning how many were
    /// removed.
    pub fn retain(&mut self, slot_id: SlotId, predicate: impl FnMut(&WordId) -> bool) -> usize {
        let slot_options = &mut self.options[slot_id];
        let before = slot_options.len();
        slot_options.retain(predicate);
        before - slot_options.len()
    }

    /// Domain sizes for every slot, for logging.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.options.iter().map(Vec::len).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::domains::Domains;

    #[test]
    fn test_new_domains_hold_whole_vocabulary() {
        let domains = Domains::new(2, 3);

        assert_eq!(domains.slot_count(), 2);
        assert_eq!(domains.get(0), &[0, 1, 2]);
        assert_eq!(domains.get(1), &[0, 1, 2]);
        assert_eq!(domains.first_empty(), None);
    }

    #[test]
    fn test_retain() {
        let mut domains = Domains::from_options(vec![vec![4, 1, 3, 1], vec![2]]);
        assert_eq!(domains.get(0), &[1, 3, 4]);

        assert_eq!(domains.retain(0, |&word_id| word_id != 3), 1);
        assert_eq!(domains.get(0), &[1, 4]);
        assert!(domains.contains(0, 4));
        assert!(!domains.contains(0, 3));

        assert_eq!(domains.retain(1, |_| false), 1);
        assert!(domains.is_empty(1));
        assert_eq!(domains.first_empty(), Some(1));
        assert_eq!(domains.sizes(), vec![2, 0]);
    }
}
