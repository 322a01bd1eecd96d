//! Growth driver placing the root and then one terminal at a time.

use crate::growth::GrowthError;
use crate::growth::config::GrowthConfig;
use crate::growth::domain::Domain;
use crate::growth::search::{Placement, test_vessel};
use crate::io::record::InsertionRecord;
use crate::model::point::Point;
use crate::model::tree::{TreeError, VascularTree};
use crate::model::vessel::{BranchingMode, FunctionTag, VesselIndex};
use rayon::prelude::*;
use tracing::{debug, info, warn};

// =#========================================================================#=
// TREE GENERATOR
// =#========================================================================#=
/// Grows a [VascularTree] inside a [Domain].
///
/// Terminal points are drawn from the domain until one lies farther than the
/// distance limit from the tree. The limit starts at
/// `dlim_correction_factor * domain.distance_limit(n)` and shrinks by
/// `dlim_reduction_factor` after every `terminal_trials` failed draws. All
/// vessels in the point's local neighborhood are tested as parents and the
/// cheapest placement is inserted.
///
/// With [TreeGenerator::recording], every committed insertion is kept as an
/// [InsertionRecord] for a later [merge](crate::merge).
pub struct TreeGenerator<D: Domain> {
    domain: D,
    config: GrowthConfig,
    function: FunctionTag,
    records: Option<Vec<InsertionRecord>>,
}

impl<D: Domain + Sync> TreeGenerator<D> {
    pub fn new(domain: D, config: GrowthConfig) -> Self {
        TreeGenerator { domain, config, function: 0, records: None }
    }

    /// Sets the functional tag of all terminals placed from now on.
    pub fn with_function(mut self, function: FunctionTag) -> Self {
        self.function = function;
        self
    }

    /// Records every committed insertion.
    pub fn recording(mut self) -> Self {
        self.records = Some(Vec::new());
        self
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Returns the insertions recorded so far; empty if not recording.
    pub fn records(&self) -> &[InsertionRecord] {
        self.records.as_deref().unwrap_or_default()
    }

    /// Takes the recorded insertions, leaving recording enabled.
    pub fn take_records(&mut self) -> Vec<InsertionRecord> {
        self.records.as_mut().map(std::mem::take).unwrap_or_default()
    }

    // ============================================================================
    // API (public)
    // ============================================================================
    /// Grows `tree` until it has `terminals` terminals, creating the root first if needed.
    ///
    /// # Errors
    /// [GrowthError::Exhausted] if a terminal cannot be placed within
    /// `max_attempts` draws; any [TreeError] of the insertion.
    pub fn grow(&mut self, tree: &mut VascularTree, terminals: usize) -> Result<(), GrowthError> {
        if tree.is_empty() && terminals > 0 {
            self.grow_root(tree)?;
        }
        while tree.num_terminals() < terminals {
            self.add_terminal(tree)?;
        }
        info!(terminals = tree.num_terminals(), cost = tree.total_cost(), "growth finished");
        Ok(())
    }

    /// Places the root from the inlet to a random point far enough from it.
    ///
    /// # Errors
    /// [GrowthError::Tree] with [TreeError::RootAlreadySet] for a non-empty
    /// tree, [GrowthError::Exhausted] if no point qualifies.
    pub fn grow_root(&mut self, tree: &mut VascularTree) -> Result<VesselIndex, GrowthError> {
        if !tree.is_empty() {
            return Err(TreeError::RootAlreadySet.into());
        }

        let inlet = tree.inlet();
        let mut dlim = self.initial_distance_limit(1);
        for attempt in 1..=self.config.max_attempts() {
            let point = self.domain.random_point();
            if self.domain.is_segment_inside(inlet, point) && inlet.distance(point) > dlim {
                let root = tree.add_root(point)?;
                debug!(attempt, dlim, "root placed");
                return Ok(root);
            }
            dlim = self.shrink(dlim, attempt);
        }

        warn!(attempts = self.config.max_attempts(), "no valid root point found");
        Err(GrowthError::Exhausted { terminals: 0, attempts: self.config.max_attempts() })
    }

    /// Places one new terminal.
    ///
    /// # Returns
    /// Indices `(iCon, iNew)` of the two vessels created by the split.
    ///
    /// # Errors
    /// [GrowthError::Tree] with [TreeError::EmptyTree] if there is no root,
    /// [GrowthError::Exhausted] if no draw leads to a valid insertion.
    pub fn add_terminal(&mut self, tree: &mut VascularTree) -> Result<(VesselIndex, VesselIndex), GrowthError> {
        if tree.is_empty() {
            return Err(TreeError::EmptyTree.into());
        }

        let terminals = tree.num_terminals();
        let mut dlim = self.initial_distance_limit(terminals);
        for attempt in 1..=self.config.max_attempts() {
            let point = self.domain.random_point();
            let placement = if self.is_far_enough(tree, point, dlim) {
                self.best_placement(tree, point)
            } else {
                None
            };
            if let Some(placement) = placement {
                match self.commit(tree, point, placement) {
                    Ok(inserted) => {
                        debug!(attempt, dlim, "terminal placed");
                        return Ok(inserted);
                    }
                    Err(TreeError::Solver(err)) => warn!(%err, "insertion rejected by solver, drawing again"),
                    Err(err) => return Err(err.into()),
                }
            }
            dlim = self.shrink(dlim, attempt);
        }

        warn!(terminals, attempts = self.config.max_attempts(), "no valid terminal point found");
        Err(GrowthError::Exhausted { terminals, attempts: self.config.max_attempts() })
    }
}

// ============================================================================
// Helpers (private)
// ============================================================================
impl<D: Domain + Sync> TreeGenerator<D> {
    fn initial_distance_limit(&self, terminals: usize) -> f64 {
        self.config.dlim_correction_factor() * self.domain.distance_limit(terminals, self.domain.perfusion_area_factor())
    }

    fn shrink(&self, dlim: f64, attempt: usize) -> f64 {
        if attempt % self.config.terminal_trials() == 0 {
            let reduced = dlim * self.config.dlim_reduction_factor();
            debug!(attempt, dlim = reduced, "distance limit reduced");
            reduced
        } else {
            dlim
        }
    }

    fn is_far_enough(&self, tree: &VascularTree, point: Point, dlim: f64) -> bool {
        self.domain.contains(point) && tree.nearest_point(point).is_some_and(|(_, distance)| distance > dlim)
    }

    /// Tests every splittable vessel near `point` and keeps the cheapest
    /// placement; ties go to the lower vessel index.
    fn best_placement(&self, tree: &VascularTree, point: Point) -> Option<Placement> {
        let neighborhood = self.domain.local_neighborhood(point, tree.num_terminals());
        let mut neighbors = tree.vessels_within_box(&neighborhood);
        if neighbors.is_empty() {
            neighbors = (0..tree.num_vessels()).collect();
        }

        let parents: Vec<VesselIndex> = neighbors
            .iter()
            .copied()
            .filter(|&index| tree[index].branching_mode() != BranchingMode::NoBranching)
            .collect();

        let test = |&parent: &VesselIndex| test_vessel(tree, point, parent, &neighbors, &self.domain, &self.config);
        let placements: Vec<Option<Placement>> = if self.config.parallel() {
            parents.par_iter().map(test).collect()
        } else {
            parents.iter().map(test).collect()
        };

        placements
            .into_iter()
            .flatten()
            .fold(None, |best: Option<Placement>, placement| match best {
                Some(current) if current.cost <= placement.cost => Some(current),
                _ => Some(placement),
            })
    }

    fn commit(
        &mut self,
        tree: &mut VascularTree,
        point: Point,
        placement: Placement,
    ) -> Result<(VesselIndex, VesselIndex), TreeError> {
        let (parent_proximal, parent_distal) = tree[placement.parent].segment();
        let inserted = tree.insert(placement.parent, placement.bifurcation, point, self.function)?;

        if let Some(records) = self.records.as_mut() {
            records.push(InsertionRecord {
                bifurcation: placement.bifurcation,
                terminal: point,
                parent_proximal,
                parent_distal,
                function: self.function,
            });
        }
        Ok(inserted)
    }
}
