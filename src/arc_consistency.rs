//! This module contains a crossword-specific implementation of node consistency and the AC-3
//! algorithm for establishing arc consistency. For our purposes, a grid is arc-consistent when,
//! for every pair of crossing slots, every option for one slot has at least one option in the other
//! slot with the same letter in the shared square. For example, if 1D doesn't have any options
//! starting with the letter A, we want to remove any options for 1A that start with the letter A.
//!
//! We keep applying this rule until no more eliminations are possible, or until some slot has no
//! options left, which means the grid can't be filled at all.

use log::{debug, trace};
use smallvec::{smallvec, SmallVec};
use std::collections::{HashSet, VecDeque};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};
use crate::types::WordId;
use crate::util::glyph_at;
use crate::{CHECK_INVARIANTS, MAX_GLYPH_COUNT};

/// A directed constraint between two crossing slots: `(x, y)` means "every option for `x` needs a
/// compatible option in `y`".
pub type SlotArc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: usize,

    /// How many options were removed across all slots.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`, identifying the slot whose domain was
/// wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
    pub revisions: usize,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Does this word fit a slot's unary constraints: the right length, and agreeing with every
/// letter prefilled in the slot's squares?
fn satisfies_unary_constraints(
    config: &GridConfig,
    slot_fill: &[Option<char>],
    word_id: WordId,
) -> bool {
    let word = &config.word_list.words[word_id];

    word.len() == slot_fill.len()
        && slot_fill
            .iter()
            .zip(&word.glyphs)
            .all(|(cell_fill, &glyph)| {
                cell_fill.map_or(true, |ch| config.word_list.glyphs[glyph] == ch)
            })
}

/// Remove every option whose length doesn't match its slot (or which contradicts a prefilled
/// letter). Returns the number of options removed.
pub fn enforce_node_consistency(config: &GridConfig, domains: &mut Domains) -> usize {
    let eliminations: usize = config
        .slot_configs
        .iter()
        .map(|slot_config| {
            let slot_fill = slot_config.fill(config.cells, config.width);
            domains.retain(slot_config.id, |&word_id| {
                satisfies_unary_constraints(config, &slot_fill, word_id)
            })
        })
        .sum();

    debug!(
        "Node consistency removed {} options; domain sizes: {:?}",
        eliminations,
        domains.sizes()
    );

    eliminations
}

/// Make `x` arc-consistent with `y` by removing any option for `x` whose letter in the shared
/// square doesn't appear in that square in any of `y`'s options. Returns whether anything was
/// removed. If the slots don't cross, there's no constraint between them and nothing happens.
pub fn revise(config: &GridConfig, domains: &mut Domains, x: SlotId, y: SlotId) -> bool {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return false;
    };

    // Which glyphs can `y` put in the shared square?
    let mut supported: SmallVec<[bool; MAX_GLYPH_COUNT]> =
        smallvec![false; config.word_list.glyphs.len()];
    for &word_id in domains.get(y) {
        if let Some(glyph) = glyph_at(config.word_list, word_id, y_cell) {
            supported[glyph] = true;
        }
    }

    let removed = domains.retain(x, |&word_id| {
        glyph_at(config.word_list, word_id, x_cell).map_or(false, |glyph| supported[glyph])
    });

    removed > 0
}

/// Bring the whole grid into an arc-consistent state, starting from the given arcs (or from every
/// arc in the grid if none are given). Whenever a slot's domain shrinks, the arcs pointing at it
/// from its other neighbors are queued again, since their options may have lost their support.
pub fn establish_arc_consistency(
    config: &GridConfig,
    domains: &mut Domains,
    initial_arcs: Option<&[SlotArc]>,
) -> ArcConsistencyResult {
    // Only a run over every arc guarantees a fully arc-consistent grid.
    let checks_whole_grid = initial_arcs.is_none();
    let initial_arcs = initial_arcs.map_or_else(|| config.arcs(), <[SlotArc]>::to_vec);

    // The queue is processed FIFO; `queued` mirrors it so we never hold the same arc twice.
    let mut queue: VecDeque<SlotArc> = VecDeque::with_capacity(initial_arcs.len());
    let mut queued: HashSet<SlotArc> = HashSet::with_capacity(initial_arcs.len());
    for arc in initial_arcs {
        if queued.insert(arc) {
            queue.push_back(arc);
        }
    }

    let mut success = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));

        let before = domains.len(x);
        success.revisions += 1;
        if !revise(config, domains, x, y) {
            continue;
        }
        success.eliminations += before - domains.len(x);

        if domains.is_empty(x) {
            trace!("Domain wipeout in slot {x} while revising against slot {y}");
            return Err(ArcConsistencyFailure {
                slot_id: x,
                revisions: success.revisions,
            });
        }

        for neighbor in config.neighbors(x) {
            if neighbor != y && queued.insert((neighbor, x)) {
                queue.push_back((neighbor, x));
            }
        }
    }

    if CHECK_INVARIANTS && checks_whole_grid && !is_arc_consistent(config, domains) {
        panic!("Arc consistency finished without an arc-consistent grid?");
    }

    debug!(
        "Arc consistency made {} revisions and removed {} options; domain sizes: {:?}",
        success.revisions,
        success.eliminations,
        domains.sizes()
    );

    Ok(success)
}

/// Check (without modifying anything) whether every option for every slot has a compatible option
/// in each crossing slot.
#[must_use]
pub fn is_arc_consistent(config: &GridConfig, domains: &Domains) -> bool {
    config.arcs().into_iter().all(|(x, y)| {
        let Some((x_cell, y_cell)) = config.overlap(x, y) else {
            return true;
        };
        domains.get(x).iter().all(|&x_word| {
            let x_glyph = glyph_at(config.word_list, x_word, x_cell);
            x_glyph.is_some()
                && domains
                    .get(y)
                    .iter()
                    .any(|&y_word| glyph_at(config.word_list, y_word, y_cell) == x_glyph)
        })
    })
}
