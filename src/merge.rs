//! Merging of recorded insertions into a base tree.
//!
//! A tree grown to `k` terminals can be completed by replaying the
//! [InsertionRecord]s of one or more derived growth runs. Each record names
//! the vessel it split by the exact coordinates of that vessel's endpoints
//! at the time of the split; [TreeMerger] keeps a map from these endpoint
//! pairs to vessel indices and updates it after every applied split.
//!
//! Parent lookup is bit-exact ([segment_key]): recorded coordinates must be
//! identical to the live ones, not merely close.
//!
//! All records are validated against the evolving key map before the tree
//! is touched, so a missing parent aborts the merge without mutation.

use crate::hydraulics::SolverError;
use crate::io::{self, InsertionRecord, RecordError};
use crate::model::point::{Point, to_bits};
use crate::model::tree::{TreeError, VascularTree};
use crate::model::vessel::VesselIndex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Bit patterns of a segment's proximal and distal coordinates.
pub type SegmentKey = [u64; 6];

/// Returns the structural lookup key of the segment `proximal -> distal`.
pub fn segment_key(proximal: Point, distal: Point) -> SegmentKey {
    let [px, py, pz] = to_bits(proximal);
    let [dx, dy, dz] = to_bits(distal);
    [px, py, pz, dx, dy, dz]
}

/// Failure of a merge.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("record {record} of sequence {sequence} names no vessel of the tree ({proximal} -> {distal})")]
    ParentNotFound { sequence: usize, record: usize, proximal: Point, distal: Point },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Position of one record: (sequence, record within sequence).
type RecordPosition = (usize, usize);

// =#========================================================================#=
// TREE MERGER
// =#========================================================================#=
/// Applies recorded insertions to a base tree.
///
/// # Example
/// ```
/// use vascular_cco::merge::TreeMerger;
/// use vascular_cco::io::InsertionRecord;
/// use vascular_cco::model::{Point, VascularTreeBuilder};
///
/// let mut base = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 1.0).build();
/// base.add_root(Point::new(0.0, 2.0, 0.0))?;
/// let record = InsertionRecord {
///     bifurcation: Point::new(0.0, 1.0, 0.0),
///     terminal: Point::new(1.0, 1.5, 0.0),
///     parent_proximal: Point::new(0.0, 0.0, 0.0),
///     parent_distal: Point::new(0.0, 2.0, 0.0),
///     function: 0,
/// };
///
/// let merged = TreeMerger::new(base).merge_fast(&[vec![record]])?;
/// assert_eq!(merged.num_terminals(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TreeMerger {
    tree: VascularTree,
    keys: HashMap<SegmentKey, VesselIndex>,
}

impl TreeMerger {
    /// Indexes all vessels of `base` by their endpoints.
    pub fn new(base: VascularTree) -> Self {
        let keys = base
            .pre_order_iter()
            .map(|vessel| (segment_key(vessel.proximal(), vessel.distal()), vessel.index()))
            .collect();
        TreeMerger { tree: base, keys }
    }

    /// Returns the number of indexed segments.
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    // ============================================================================
    // API (public)
    // ============================================================================
    /// Applies all sequences one after another, settling once at the end.
    ///
    /// # Errors
    /// [MergeError::ParentNotFound] before any change if a record's parent
    /// does not exist at its turn; [MergeError::Tree] if a split is
    /// degenerate; [MergeError::Solver] if the merged tree cannot be settled.
    pub fn merge_fast(mut self, sequences: &[Vec<InsertionRecord>]) -> Result<VascularTree, MergeError> {
        let schedule = sequential_schedule(sequences);
        self.validate(sequences, &schedule)?;

        for &(sequence, record) in &schedule {
            self.apply(sequences, (sequence, record), false)?;
        }
        let iterations = self.tree.settle()?;

        info!(
            records = schedule.len(),
            terminals = self.tree.num_terminals(),
            iterations,
            cost = self.tree.total_cost(),
            "sequences merged"
        );
        Ok(self.tree)
    }

    /// Applies the sequences round-robin, one record of each in turn, settling
    /// after every insertion.
    ///
    /// # Errors
    /// As [TreeMerger::merge_fast].
    pub fn merge(mut self, sequences: &[Vec<InsertionRecord>]) -> Result<VascularTree, MergeError> {
        let schedule = interleaved_schedule(sequences);
        self.validate(sequences, &schedule)?;

        for &(sequence, record) in &schedule {
            self.apply(sequences, (sequence, record), true)?;
        }

        info!(
            records = schedule.len(),
            terminals = self.tree.num_terminals(),
            cost = self.tree.total_cost(),
            "sequences merged interleaved"
        );
        Ok(self.tree)
    }
}

// ============================================================================
// Helpers (private)
// ============================================================================
impl TreeMerger {
    /// Replays the key updates of `schedule` without touching the tree.
    fn validate(&self, sequences: &[Vec<InsertionRecord>], schedule: &[RecordPosition]) -> Result<(), MergeError> {
        let mut keys: HashSet<SegmentKey> = self.keys.keys().copied().collect();
        for &(sequence, record) in schedule {
            let entry = &sequences[sequence][record];
            if !keys.remove(&segment_key(entry.parent_proximal, entry.parent_distal)) {
                return Err(MergeError::ParentNotFound {
                    sequence,
                    record,
                    proximal: entry.parent_proximal,
                    distal: entry.parent_distal,
                });
            }
            keys.insert(segment_key(entry.parent_proximal, entry.bifurcation));
            keys.insert(segment_key(entry.bifurcation, entry.parent_distal));
            keys.insert(segment_key(entry.bifurcation, entry.terminal));
        }
        Ok(())
    }

    fn apply(
        &mut self,
        sequences: &[Vec<InsertionRecord>],
        (sequence, record): RecordPosition,
        settle: bool,
    ) -> Result<(), MergeError> {
        let entry = &sequences[sequence][record];
        let parent = self
            .keys
            .remove(&segment_key(entry.parent_proximal, entry.parent_distal))
            .ok_or(MergeError::ParentNotFound {
                sequence,
                record,
                proximal: entry.parent_proximal,
                distal: entry.parent_distal,
            })?;

        let (connection, terminal) = if settle {
            self.tree.insert(parent, entry.bifurcation, entry.terminal, entry.function)?
        } else {
            self.tree.split(parent, entry.bifurcation, entry.terminal, entry.function)?
        };

        for index in [parent, connection, terminal] {
            let vessel = &self.tree[index];
            self.keys.insert(segment_key(vessel.proximal(), vessel.distal()), index);
        }
        debug!(sequence, record, parent, "record applied");
        Ok(())
    }
}

fn sequential_schedule(sequences: &[Vec<InsertionRecord>]) -> Vec<RecordPosition> {
    sequences
        .iter()
        .enumerate()
        .flat_map(|(sequence, records)| (0..records.len()).map(move |record| (sequence, record)))
        .collect()
}

fn interleaved_schedule(sequences: &[Vec<InsertionRecord>]) -> Vec<RecordPosition> {
    let rounds = sequences.iter().map(Vec::len).max().unwrap_or(0);
    (0..rounds)
        .flat_map(|record| {
            sequences
                .iter()
                .enumerate()
                .filter(move |(_, records)| record < records.len())
                .map(move |(sequence, _)| (sequence, record))
        })
        .collect()
}

// ============================================================================
// Quick API
// ============================================================================
/// Merges `sequences` into `base` with [TreeMerger::merge_fast].
pub fn merge(base: VascularTree, sequences: &[Vec<InsertionRecord>]) -> Result<VascularTree, MergeError> {
    TreeMerger::new(base).merge_fast(sequences)
}

/// Reads one record sequence per file and merges them into `base`.
///
/// All files are read completely before the tree is changed.
///
/// # Errors
/// [MergeError::Record] for an unreadable or malformed file, otherwise as
/// [TreeMerger::merge_fast].
pub fn merge_files<P: AsRef<Path>>(base: VascularTree, paths: &[P]) -> Result<VascularTree, MergeError> {
    let sequences = paths
        .iter()
        .map(io::read_records)
        .collect::<Result<Vec<_>, _>>()?;
    merge(base, &sequences)
}
