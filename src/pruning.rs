//! Pruning of vascular trees by per-vessel rules.
//!
//! [prune] copies a tree breadth-first, dropping every vessel flagged by any
//! [PruningRule] together with its subtree. A bifurcation left with a single
//! surviving child is fused with that child into one straight vessel, so the
//! result is again a proper binary tree. The copy is settled before it is
//! returned.

use crate::hydraulics::SolverError;
use crate::model::tree::VascularTree;
use crate::model::vessel::{Stage, Vessel, VesselIndex};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::info;

/// Failure of [prune].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PruneError {
    #[error("cannot prune an empty tree")]
    EmptyTree,

    #[error("pruning rules flag the root vessel")]
    RootPruned,

    #[error(transparent)]
    Solver(#[from] SolverError),
}

// =#========================================================================#=
// PRUNING RULES
// =#========================================================================#=
/// Decides from a vessel's own state whether it is removed.
pub trait PruningRule: Send + Sync {
    fn needs_pruning(&self, vessel: &Vessel) -> bool;
}

/// Flags terminals created at a given stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OldLeavesRule {
    stage: Stage,
}

impl OldLeavesRule {
    pub fn new(stage: Stage) -> Self {
        OldLeavesRule { stage }
    }
}

impl PruningRule for OldLeavesRule {
    fn needs_pruning(&self, vessel: &Vessel) -> bool {
        vessel.is_leaf() && vessel.stage() == self.stage
    }
}

/// Flags vessels matching an arbitrary predicate.
///
/// # Example
/// ```
/// use vascular_cco::pruning::{PredicateRule, PruningRule};
///
/// let short = PredicateRule::new(|vessel: &vascular_cco::model::Vessel| vessel.length() < 0.1);
/// # let _ = &short as &dyn PruningRule;
/// ```
pub struct PredicateRule<F> {
    predicate: F,
}

impl<F> PredicateRule<F>
where
    F: Fn(&Vessel) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        PredicateRule { predicate }
    }
}

impl<F> PruningRule for PredicateRule<F>
where
    F: Fn(&Vessel) -> bool + Send + Sync,
{
    fn needs_pruning(&self, vessel: &Vessel) -> bool {
        (self.predicate)(vessel)
    }
}

// =#========================================================================#=
// PRUNE
// =#========================================================================#=
/// Returns a settled copy of `tree` without the vessels flagged by `rules`.
///
/// Rules are tested in order and a vessel is removed as soon as one flags
/// it. Surviving vessels keep their IDs, stages, tags and branching modes
/// and are renumbered in breadth-first order.
///
/// # Errors
/// [PruneError::EmptyTree] for an empty tree, [PruneError::RootPruned] if a
/// rule flags the root, [PruneError::Solver] if the copy cannot be settled.
pub fn prune(tree: &VascularTree, rules: &[&dyn PruningRule]) -> Result<VascularTree, PruneError> {
    let root = tree.root_index().ok_or(PruneError::EmptyTree)?;
    let flagged = |vessel: &Vessel| rules.iter().any(|rule| rule.needs_pruning(vessel));
    if flagged(&tree[root]) {
        return Err(PruneError::RootPruned);
    }

    let mut vessels: Vec<Vessel> = Vec::with_capacity(tree.num_vessels());
    let mut children_of: Vec<Vec<VesselIndex>> = Vec::with_capacity(tree.num_vessels());
    // (index in tree, index of the copied parent)
    let mut queue: VecDeque<(VesselIndex, Option<VesselIndex>)> = VecDeque::from([(root, None)]);

    while let Some((original, parent)) = queue.pop_front() {
        let mut copy = tree[original].clone();
        copy.index = vessels.len();
        copy.parent = parent;
        copy.children = None;

        let mut current = original;
        loop {
            let survivors: Vec<VesselIndex> = match tree[current].children() {
                None => Vec::new(),
                Some((left, right)) => [left, right].into_iter().filter(|&child| !flagged(&tree[child])).collect(),
            };
            if let [only] = survivors[..] {
                copy.set_distal(tree[only].distal());
                current = only;
                continue;
            }
            for child in survivors {
                queue.push_back((child, Some(copy.index)));
            }
            break;
        }

        if let Some(parent) = parent {
            children_of[parent].push(copy.index);
        }
        children_of.push(Vec::new());
        vessels.push(copy);
    }

    for (vessel, children) in vessels.iter_mut().zip(children_of) {
        vessel.children = match children[..] {
            [left, right] => Some((left, right)),
            _ => None,
        };
    }

    let removed = tree.num_vessels() - vessels.len();
    let mut pruned = tree.empty_like();
    pruned.install_vessels(vessels, 0, tree.next_id());
    let iterations = pruned.settle()?;

    info!(
        removed,
        terminals = pruned.num_terminals(),
        iterations,
        cost = pruned.total_cost(),
        "tree pruned"
    );
    Ok(pruned)
}
