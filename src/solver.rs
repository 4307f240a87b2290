//! The entry point for filling a grid: establish node consistency, then arc consistency, then run
//! the backtracking search over whatever options are left.

use log::debug;
use std::time::Instant;

use crate::arc_consistency::{
    enforce_node_consistency, establish_arc_consistency, ArcConsistencyFailure,
    ArcConsistencySuccess, SlotArc,
};
use crate::backtracking_search::{search, FillFailure, FillSuccess, Statistics};
use crate::domains::Domains;
use crate::grid_config::GridConfig;

/// A single fill attempt: the grid being filled plus the domain store it narrows along the way.
pub struct Solver<'a> {
    config: GridConfig<'a>,
    domains: Domains,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    /// Start a fill attempt in which every slot may take any word in the word list.
    #[must_use]
    pub fn new(config: &GridConfig<'a>) -> Solver<'a> {
        Solver::with_domains(
            config,
            Domains::new(config.slot_configs.len(), config.word_list.len()),
        )
    }

    /// Start a fill attempt from explicit domains.
    #[must_use]
    pub fn with_domains(config: &GridConfig<'a>, domains: Domains) -> Solver<'a> {
        assert_eq!(
            domains.slot_count(),
            config.slot_configs.len(),
            "Domain count must match slot count"
        );

        Solver {
            config: *config,
            domains,
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Remove options that can't fit their slots on their own. Returns the number removed.
    pub fn enforce_node_consistency(&mut self) -> usize {
        let start = Instant::now();
        let eliminations = enforce_node_consistency(&self.config, &mut self.domains);
        self.statistics.node_eliminations += eliminations;
        self.statistics.consistency_time += start.elapsed();
        eliminations
    }

    /// Establish arc consistency starting from the given arcs, or from every arc in the grid.
    pub fn enforce_arc_consistency(
        &mut self,
        initial_arcs: Option<&[SlotArc]>,
    ) -> Result<ArcConsistencySuccess, FillFailure> {
        let start = Instant::now();
        let result = establish_arc_consistency(&self.config, &mut self.domains, initial_arcs);
        self.statistics.consistency_time += start.elapsed();

        match result {
            Ok(success) => {
                self.statistics.arc_revisions += success.revisions;
                self.statistics.arc_eliminations += success.eliminations;
                Ok(success)
            }
            Err(ArcConsistencyFailure { slot_id, revisions }) => {
                self.statistics.arc_revisions += revisions;
                Err(FillFailure::DomainWipeout { slot_id })
            }
        }
    }

    /// Fill the grid, or report that it can't be filled.
    pub fn solve(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();

        self.enforce_node_consistency();

        // A slot with no crossings would never be revised, so catch an empty domain here rather
        // than leaving it to the search.
        if let Some(slot_id) = self.domains.first_empty() {
            debug!("No options of the right length for slot {slot_id}");
            self.statistics.total_time = start.elapsed();
            return Err(FillFailure::DomainWipeout { slot_id });
        }

        if let Err(failure) = self.enforce_arc_consistency(None) {
            debug!("Arc consistency failed: {failure}");
            self.statistics.total_time = start.elapsed();
            return Err(failure);
        }

        let search_start = Instant::now();
        let result = search(&self.config, &self.domains, &mut self.statistics);
        self.statistics.search_time += search_start.elapsed();
        self.statistics.total_time = start.elapsed();

        debug!("Fill finished: {:?}", self.statistics);

        result.map(|assignment| FillSuccess {
            statistics: self.statistics.clone(),
            choices: assignment.choices(),
            assignment,
        })
    }
}

/// Search for a valid fill for the given grid, using the whole word list as every slot's
/// starting domain.
pub fn find_fill(config: &GridConfig) -> Result<FillSuccess, FillFailure> {
    Solver::new(config).solve()
}
