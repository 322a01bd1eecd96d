//! Bifurcation search: proposes and scores insertion geometries for a new
//! terminal against one candidate parent vessel.
//!
//! For a parent vessel and a new terminal point, candidate bifurcation points
//! are swept over a barycentric grid on the triangle (proximal, distal, new)
//! (see [branching_points]). Each candidate is checked in order for
//! 1. bifurcation and plane angles ([are_valid_angles], [is_valid_plane_angle]),
//! 2. domain membership of the three prospective segments,
//! 3. crossings with neighboring vessels ([is_intersecting]),
//! 4. hydraulic feasibility and symmetry on a speculative clone ([evaluate]).
//!
//! Failing candidates cost `f64::INFINITY`. [test_vessel] returns the
//! cheapest finite candidate, if any.

use crate::growth::config::GrowthConfig;
use crate::growth::domain::Domain;
use crate::model::point::Point;
use crate::model::tree::{TreeError, VascularTree};
use crate::model::vessel::{BranchingMode, Vessel, VesselIndex};
use crate::spatial::segment_intersection;
use rayon::prelude::*;
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, trace};

/// Smallest grid resolution with a point strictly between two corners.
pub const MIN_BIFURCATION_TESTS: usize = 3;

/// Best insertion found by [test_vessel].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Vessel to split.
    pub parent: VesselIndex,
    /// New distal point of the parent.
    pub bifurcation: Point,
    /// Cost of the tree after insertion.
    pub cost: f64,
}

// ============================================================================
// Candidate geometry
// ============================================================================
/// Candidate bifurcation points for attaching `new_point` to `vessel`.
///
/// With `n = tests` and `ds = 1 / (n - 1)`, the deformable grid holds
/// `proximal * (1 - i ds - j ds) + distal * i ds + new_point * j ds` for
/// `i + j < n`, without the corners at the proximal, distal and new points.
/// Rigid vessels only get the interior points of their own segment; vessels
/// without branching get none. Grids with fewer than 3 points per edge have
/// no interior points and yield none.
pub fn branching_points(vessel: &Vessel, new_point: Point, tests: usize) -> Vec<Point> {
    if tests < MIN_BIFURCATION_TESTS {
        return Vec::new();
    }
    let ds = 1.0 / (tests - 1) as f64;
    let (proximal, distal) = vessel.segment();

    match vessel.branching_mode() {
        BranchingMode::NoBranching => Vec::new(),
        BranchingMode::Rigid => (1..tests - 1)
            .map(|i| {
                let eps = i as f64 * ds;
                proximal * (1.0 - eps) + distal * eps
            })
            .collect(),
        BranchingMode::Deformable => {
            let mut points = Vec::with_capacity(tests * (tests + 1) / 2);
            for i in 0..tests {
                for j in 0..tests - i {
                    if (i == 0 && j == 0) || i == tests - 1 || j == tests - 1 {
                        continue;
                    }
                    let eps = i as f64 * ds;
                    let nu = j as f64 * ds;
                    points.push(proximal * (1.0 - eps - nu) + distal * eps + new_point * nu);
                }
            }
            points
        }
    }
}

/// Checks the two angles the new vessel forms at `bifurcation`.
///
/// The angles between the new segment and the continuation segment, and
/// between the new segment and the proximal segment, must both lie in
/// `[min_angle, pi - min_angle]`.
pub fn are_valid_angles(bifurcation: Point, new_point: Point, parent: &Vessel, min_angle: f64) -> bool {
    let new_direction = new_point - bifurcation;
    let continuation = parent.distal() - bifurcation;
    let upstream = parent.proximal() - bifurcation;
    let max_deviation = FRAC_PI_2 - min_angle;

    let deviation = |other: Point| (new_direction.angle_between(other) - FRAC_PI_2).abs();

    !(deviation(continuation) > max_deviation || deviation(upstream) > max_deviation)
}

/// Checks the angle between the new vessel and the plane of the parent's two parts.
///
/// Disabled for `min_plane_angle <= 0`. Collinear parent parts span no plane
/// and pass.
pub fn is_valid_plane_angle(bifurcation: Point, new_point: Point, parent: &Vessel, min_plane_angle: f64) -> bool {
    if min_plane_angle <= 0.0 {
        return true;
    }

    let new_direction = new_point - bifurcation;
    let normal = (parent.proximal() - bifurcation).cross(parent.distal() - bifurcation);
    let scale = new_direction.length() * normal.length();
    if scale == 0.0 {
        return true;
    }

    let opening = FRAC_PI_2 - (new_direction.dot(normal).abs() / scale).min(1.0).acos();
    opening >= min_plane_angle
}

/// Returns whether the segment `from -> to` crosses any of `neighbors`, `parent` excluded.
pub fn is_intersecting(tree: &VascularTree, from: Point, to: Point, parent: VesselIndex, neighbors: &[VesselIndex]) -> bool {
    neighbors
        .iter()
        .filter(|&&neighbor| neighbor != parent)
        .filter_map(|&neighbor| tree.vessel(neighbor))
        .any(|neighbor| segment_intersection(neighbor.proximal(), neighbor.distal(), from, to).intersects)
}

// ============================================================================
// Evaluation
// ============================================================================
/// Speculative insertion against one parent.
struct TrialEvaluator<'a> {
    tree: &'a VascularTree,
    parent: VesselIndex,
    config: &'a GrowthConfig,
    /// Cost of the committed vessels outside the cloned subtree.
    outside_cost: f64,
}

impl<'a> TrialEvaluator<'a> {
    fn new(tree: &'a VascularTree, parent: VesselIndex, config: &'a GrowthConfig) -> Result<Self, TreeError> {
        let outside_cost = match config.evaluation_levels() {
            None => 0.0,
            Some(levels) => {
                let (subtree, _) = tree.clone_up_to(levels, parent)?;
                let estimator = config.cost_estimator();
                estimator.tree_cost(tree) - estimator.tree_cost(&subtree)
            }
        };
        Ok(TrialEvaluator { tree, parent, config, outside_cost })
    }

    fn cost(&self, new_point: Point, bifurcation: Point) -> f64 {
        match self.try_cost(new_point, bifurcation) {
            Ok(cost) => cost,
            Err(err) => {
                debug!(parent = self.parent, %err, "candidate rejected");
                f64::INFINITY
            }
        }
    }

    fn try_cost(&self, new_point: Point, bifurcation: Point) -> Result<f64, TreeError> {
        let (mut trial, parent) = match self.config.evaluation_levels() {
            None => (self.tree.clone(), self.parent),
            Some(levels) => self.tree.clone_up_to(levels, self.parent)?,
        };

        let (connection, terminal) = trial.split(parent, bifurcation, new_point, 0)?;
        trial.settle()?;

        let (connection_beta, terminal_beta) = (trial[connection].beta(), trial[terminal].beta());
        let symmetry = connection_beta.min(terminal_beta) / connection_beta.max(terminal_beta);
        let lower_bound = trial.constraints().symmetry_lower_bound(trial[connection].level());
        if !(symmetry >= lower_bound) {
            trace!(symmetry, lower_bound, "asymmetric bifurcation rejected");
            return Ok(f64::INFINITY);
        }

        Ok(self.outside_cost + self.config.cost_estimator().tree_cost(&trial))
    }

    /// Runs all checks for one candidate.
    fn candidate_cost<D>(&self, new_point: Point, bifurcation: Point, neighbors: &[VesselIndex], domain: &D) -> f64
    where
        D: Domain + ?Sized,
    {
        let parent = &self.tree[self.parent];
        let (proximal, distal) = parent.segment();

        if !are_valid_angles(bifurcation, new_point, parent, self.config.min_bifurcation_angle())
            || !is_valid_plane_angle(bifurcation, new_point, parent, self.config.min_plane_angle())
        {
            return f64::INFINITY;
        }
        if !domain.is_segment_inside(new_point, bifurcation)
            || !domain.is_segment_inside(proximal, bifurcation)
            || !domain.is_segment_inside(distal, bifurcation)
        {
            return f64::INFINITY;
        }
        if is_intersecting(self.tree, new_point, bifurcation, self.parent, neighbors)
            || is_intersecting(self.tree, proximal, bifurcation, self.parent, neighbors)
            || is_intersecting(self.tree, distal, bifurcation, self.parent, neighbors)
        {
            return f64::INFINITY;
        }

        self.cost(new_point, bifurcation)
    }
}

/// Cost of the tree after splitting `parent` at `bifurcation` towards `new_point`.
///
/// Clones the tree (or the configured number of levels above `parent`),
/// splits the clone, settles it and scores it with the configured cost
/// estimator. The committed tree is never modified.
///
/// # Returns
/// The cost, or `f64::INFINITY` if the split is invalid, the solver
/// diverges, or the sibling radius ratio at the new bifurcation falls below
/// the tree's symmetry lower bound.
pub fn evaluate(
    tree: &VascularTree,
    new_point: Point,
    bifurcation: Point,
    parent: VesselIndex,
    config: &GrowthConfig,
) -> f64 {
    match TrialEvaluator::new(tree, parent, config) {
        Ok(evaluator) => evaluator.cost(new_point, bifurcation),
        Err(_) => f64::INFINITY,
    }
}

/// Cost of one candidate bifurcation including all geometric checks.
///
/// Angle, domain and intersection checks come first; a candidate failing any
/// of them costs `f64::INFINITY` whatever its hydraulic cost. Otherwise the
/// result of [evaluate].
pub fn candidate_cost<D>(
    tree: &VascularTree,
    new_point: Point,
    bifurcation: Point,
    parent: VesselIndex,
    neighbors: &[VesselIndex],
    domain: &D,
    config: &GrowthConfig,
) -> f64
where
    D: Domain + ?Sized,
{
    if tree.vessel(parent).is_none() {
        return f64::INFINITY;
    }
    match TrialEvaluator::new(tree, parent, config) {
        Ok(evaluator) => evaluator.candidate_cost(new_point, bifurcation, neighbors, domain),
        Err(_) => f64::INFINITY,
    }
}

/// Finds the cheapest bifurcation for attaching `new_point` to `parent`.
///
/// Sweeps [branching_points], scoring candidates on the rayon pool unless
/// the configuration is sequential. Ties go to the first candidate in grid
/// order, so results do not depend on scheduling.
///
/// # Arguments
/// * `tree` - Committed tree, left untouched
/// * `new_point` - Terminal to attach
/// * `parent` - Vessel to split
/// * `neighbors` - Vessels checked for crossings, usually from
///   [Domain::local_neighborhood]
/// * `domain` - Perfusion domain for segment membership
/// * `config` - Search settings
///
/// # Returns
/// The best placement, or `None` if no candidate has finite cost.
pub fn test_vessel<D>(
    tree: &VascularTree,
    new_point: Point,
    parent: VesselIndex,
    neighbors: &[VesselIndex],
    domain: &D,
    config: &GrowthConfig,
) -> Option<Placement>
where
    D: Domain + Sync + ?Sized,
{
    let vessel = tree.vessel(parent)?;
    let evaluator = TrialEvaluator::new(tree, parent, config).ok()?;
    let candidates = branching_points(vessel, new_point, config.bifurcation_tests());

    let score = |bifurcation: &Point| evaluator.candidate_cost(new_point, *bifurcation, neighbors, domain);
    let costs: Vec<f64> = if config.parallel() {
        candidates.par_iter().map(score).collect()
    } else {
        candidates.iter().map(score).collect()
    };

    let mut best: Option<Placement> = None;
    for (bifurcation, cost) in candidates.into_iter().zip(costs) {
        if cost.is_finite() && best.is_none_or(|placement| cost < placement.cost) {
            best = Some(Placement { parent, bifurcation, cost });
        }
    }

    match &best {
        Some(placement) => debug!(parent, cost = placement.cost, "best bifurcation found"),
        None => debug!(parent, "no valid bifurcation"),
    }
    best
}
