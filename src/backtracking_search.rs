//! This module implements grid-filling using a depth-first backtracking search over partial
//! assignments. Slots are chosen by the minimum-remaining-values heuristic (ties broken by degree,
//! then by slot id) and words are tried in least-constraining-value order. There is no propagation
//! during the search itself: each tentative assignment is only checked pairwise against the slots
//! that are already assigned, which is enough because every constraint is unary or binary.

use log::trace;
use smallvec::{smallvec, SmallVec};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::time::Duration;
use thiserror::Error;

use crate::domains::Domains;
use crate::grid_config::{Choice, GridConfig, SlotId};
use crate::types::WordId;
use crate::util::{build_glyph_counts_by_cell, glyph_at};
use crate::{CHECK_INVARIANTS, MAX_GLYPH_COUNT, MAX_SLOT_COUNT};

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Number of calls to `backtrack`, i.e. partial assignments visited.
    pub states: usize,

    /// Number of tentative assignments that were undone.
    pub backtracks: usize,

    /// Number of times a tentative assignment was checked with `is_consistent`.
    pub consistency_checks: usize,

    /// Number of options removed by node consistency.
    pub node_eliminations: usize,

    /// Number of arcs revised by arc consistency.
    pub arc_revisions: usize,

    /// Number of options removed by arc consistency.
    pub arc_eliminations: usize,

    pub total_time: Duration,
    pub consistency_time: Duration,
    pub search_time: Duration,
}

/// A partial (or complete) mapping from slots to the words chosen for them.
#[derive(Clone, PartialEq, Eq)]
pub struct Assignment {
    words: SmallVec<[Option<WordId>; MAX_SLOT_COUNT]>,
    assigned_count: usize,
}

impl Debug for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Assignment {
    /// An empty assignment for a grid with the given number of slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: smallvec![None; slot_count],
            assigned_count: 0,
        }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.words.len()
    }

    /// The number of slots that have a word.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    #[must_use]
    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    /// Is this word already used by any slot?
    #[must_use]
    pub fn uses_word(&self, word_id: WordId) -> bool {
        self.words.contains(&Some(word_id))
    }

    /// Give a slot a word, returning the word it had before (if any).
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) -> Option<WordId> {
        let previous = self.words[slot_id].replace(word_id);
        if previous.is_none() {
            self.assigned_count += 1;
        }
        previous
    }

    /// Take a slot's word away, returning it.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.words[slot_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    /// The assigned `(slot, word)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    /// The assignment as a list of `Choice`s, in slot order.
    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }
}

/// Why a fill attempt didn't produce a grid. Neither case is exceptional: both just mean the
/// puzzle has no solution with the given vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    /// Node or arc consistency left this slot with no options.
    #[error("No solution: no word fits slot {slot_id}")]
    DomainWipeout { slot_id: SlotId },

    /// The search tried every candidate without finding a complete assignment.
    #[error("No solution: search exhausted every assignment")]
    Exhausted,
}

/// A struct representing the results of a fill operation.
#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
    pub choices: Vec<Choice>,
}

/// Choose the next slot to fill: the unassigned slot with the fewest remaining options, preferring
/// slots that cross more other slots, and then the lowest slot id. Returns `None` if every slot is
/// assigned.
#[must_use]
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_configs.len())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| (domains.len(slot_id), Reverse(config.degree(slot_id))))
}

/// Return the slot's options in ascending order of how many options each one would rule out in
/// the crossing slots that don't have a word yet. Ties keep domain order. This only reorders;
/// every option in the domain is returned.
#[must_use]
pub fn order_domain_values(
    config: &GridConfig,
    domains: &Domains,
    slot_id: SlotId,
    assignment: &Assignment,
) -> Vec<WordId> {
    // For each unassigned crossing slot: the cell of our slot it crosses, how many options it has,
    // and how many of those have each glyph in the shared square.
    let crossing_counts: Vec<(usize, u32, SmallVec<[u32; MAX_GLYPH_COUNT]>)> = config
        .neighbors(slot_id)
        .into_iter()
        .filter(|&neighbor| !assignment.is_assigned(neighbor))
        .filter_map(|neighbor| {
            let (cell_idx, neighbor_cell_idx) = config.overlap(slot_id, neighbor)?;
            let mut glyph_counts_by_cell = build_glyph_counts_by_cell(
                config.word_list,
                config.slot_configs[neighbor].length,
                domains.get(neighbor),
            );
            Some((
                cell_idx,
                domains.len(neighbor) as u32,
                glyph_counts_by_cell.swap_remove(neighbor_cell_idx),
            ))
        })
        .collect();

    let mut values: Vec<WordId> = domains.get(slot_id).to_vec();

    values.sort_by_cached_key(|&word_id| {
        crossing_counts
            .iter()
            .map(|(cell_idx, option_count, glyph_counts)| {
                let compatible = glyph_at(config.word_list, word_id, *cell_idx)
                    .map_or(0, |glyph| glyph_counts[glyph]);
                option_count - compatible
            })
            .sum::<u32>()
    });

    values
}

/// Is the assignment free of conflicts? That means no word is used twice, every word has the
/// length of its slot, and every pair of assigned crossing slots agrees on the shared square.
#[must_use]
pub fn is_consistent(config: &GridConfig, assignment: &Assignment) -> bool {
    let mut seen: HashSet<WordId> = HashSet::with_capacity(assignment.len());

    for (slot_id, word_id) in assignment.iter() {
        if !seen.insert(word_id) {
            return false;
        }

        if config.word_list.words[word_id].len() != config.slot_configs[slot_id].length {
            return false;
        }

        for neighbor in config.neighbors(slot_id) {
            let Some(neighbor_word_id) = assignment.get(neighbor) else {
                continue;
            };
            let Some((cell_idx, neighbor_cell_idx)) = config.overlap(slot_id, neighbor) else {
                continue;
            };
            let glyph = glyph_at(config.word_list, word_id, cell_idx);
            if glyph.is_none()
                || glyph != glyph_at(config.word_list, neighbor_word_id, neighbor_cell_idx)
            {
                return false;
            }
        }
    }

    true
}

/// Does every slot have a word?
#[must_use]
pub fn is_complete(config: &GridConfig, assignment: &Assignment) -> bool {
    assignment.slot_count() == config.slot_configs.len()
        && (0..config.slot_configs.len()).all(|slot_id| assignment.is_assigned(slot_id))
}

/// Extend the given consistent partial assignment to a complete one. On success, returns true and
/// leaves the complete assignment in place. On failure, returns false and leaves the assignment
/// exactly as it was passed in.
pub fn backtrack(
    config: &GridConfig,
    domains: &Domains,
    assignment: &mut Assignment,
    statistics: &mut Statistics,
) -> bool {
    statistics.states += 1;

    if is_complete(config, assignment) {
        return true;
    }

    let Some(slot_id) = select_unassigned_slot(config, domains, assignment) else {
        return false;
    };

    let snapshot = if CHECK_INVARIANTS {
        Some(assignment.clone())
    } else {
        None
    };

    for word_id in order_domain_values(config, domains, slot_id, assignment) {
        if assignment.uses_word(word_id) {
            continue;
        }

        assignment.assign(slot_id, word_id);
        statistics.consistency_checks += 1;

        if is_consistent(config, assignment) {
            trace!(
                "Trying {} in slot {} ({} of {} slots assigned)",
                config.word_list.word_str(word_id),
                config.slot_configs[slot_id].slot_key(),
                assignment.len(),
                assignment.slot_count()
            );

            if backtrack(config, domains, assignment, statistics) {
                return true;
            }
        }

        assignment.unassign(slot_id);
        statistics.backtracks += 1;
    }

    trace!(
        "No word fits slot {}; backtracking",
        config.slot_configs[slot_id].slot_key()
    );

    if let Some(snapshot) = snapshot {
        if *assignment != snapshot {
            panic!("Backtracking left residue in the assignment?");
        }
    }

    false
}

/// Search for a complete assignment for the grid given the (already consistent) domains.
pub fn search(
    config: &GridConfig,
    domains: &Domains,
    statistics: &mut Statistics,
) -> Result<Assignment, FillFailure> {
    let mut assignment = Assignment::new(config.slot_configs.len());

    if backtrack(config, domains, &mut assignment, statistics) {
        Ok(assignment)
    } else {
        Err(FillFailure::Exhausted)
    }
}
