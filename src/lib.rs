//! Vascular-cco is a library to grow, prune and merge binary vascular trees
//! by constrained constructive optimization (CCO).
//!
//! A tree connects a single inlet to a growing set of terminal points. Every
//! vessel is a straight segment; radii follow from a bifurcation law and the
//! whole tree is kept hydraulically consistent after every change.
//! Core functionality provided:
//! - Tree model: [VascularTree] arena of [Vessel](model::Vessel)s with
//!   split/insert, speculative clones and traversal iterators.
//!   See [crate::model] for more details.
//! - Hydraulics: flow pass plus a radius/viscosity fixed point with a
//!   divergence guard. See [crate::hydraulics].
//! - Growth: bifurcation search over a barycentric candidate grid with angle,
//!   domain, intersection and symmetry checks, driven by a
//!   [TreeGenerator](growth::TreeGenerator). See [crate::growth].
//! - Pruning: rule-based removal of vessels and their subtrees.
//!   See [crate::pruning].
//! - Merging: replay of recorded insertions onto a base tree, with the binary
//!   record format in [crate::io]. See [crate::merge].
//!
//! Limitations:
//! - Only binary trees with a single inlet
//! - Uniform flow demand at all terminals
//! - Parallel growth of disjoint domains is left to the caller, who can merge
//!   the recorded results
//!
//! # Usage patterns
//! 1. [grow_tree] and [merge_record_files] give quick access with default
//!    settings.
//! 2. Configure trees with [VascularTreeBuilder](model::VascularTreeBuilder)
//!    and growth with [GrowthConfig](growth::GrowthConfig) for full control.
//!
//! ## Example Default Configuration
//! ```
//! use vascular_cco::grow_tree;
//! use vascular_cco::growth::BoxDomain;
//! use vascular_cco::model::Point;
//!
//! let domain = BoxDomain::new(Point::new(-1.0, 0.0, 0.0), Point::new(1.0, 2.0, 0.0), 7);
//! let tree = grow_tree(domain, Point::new(0.0, 0.0, 0.0), 1.0, 5)?;
//! assert_eq!(tree.num_terminals(), 5);
//! # Ok::<(), vascular_cco::growth::GrowthError>(())
//! ```
//!
//! ## Example Configuration
//! ```
//! use vascular_cco::growth::{BoxDomain, GrowthConfig, TreeGenerator};
//! use vascular_cco::model::{Point, TreeConstraints, VascularTreeBuilder};
//!
//! let constraints = TreeConstraints::new(
//!     TreeConstraints::constant_viscosity(),
//!     TreeConstraints::two_level_exponent(),
//!     TreeConstraints::no_symmetry(),
//! );
//! let mut tree = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 2.0)
//!     .with_root_radius(0.2)
//!     .with_constraints(constraints)
//!     .build();
//!
//! let config = GrowthConfig::builder()
//!     .with_bifurcation_tests(5)
//!     .with_min_bifurcation_angle(0.2)
//!     .sequential()
//!     .build()?;
//! let domain = BoxDomain::new(Point::new(-1.0, 0.0, 0.0), Point::new(1.0, 2.0, 0.0), 11);
//! let mut generator = TreeGenerator::new(domain, config).recording();
//! generator.grow(&mut tree, 4)?;
//! assert_eq!(generator.records().len(), 3);
//! # Ok::<(), vascular_cco::growth::GrowthError>(())
//! ```

pub mod growth;
pub mod hydraulics;
pub mod io;
pub mod merge;
pub mod model;
pub mod pruning;
pub mod spatial;

use crate::growth::{Domain, GrowthConfig, GrowthError, TreeGenerator};
use crate::merge::MergeError;
use crate::model::{Point, VascularTree, VascularTreeBuilder};
use std::path::Path;

// ============================================================================
// Quick Growth API
// ============================================================================
/// Grows a tree with default settings from `inlet` to `terminals` terminals
/// inside `domain`, returning the settled [VascularTree].
///
/// See [TreeGenerator::grow] for full documentation.
pub fn grow_tree<D: Domain + Sync>(
    domain: D,
    inlet: Point,
    inlet_flow: f64,
    terminals: usize,
) -> Result<VascularTree, GrowthError> {
    let mut tree = VascularTreeBuilder::new(inlet, inlet_flow).build();
    TreeGenerator::new(domain, GrowthConfig::default()).grow(&mut tree, terminals)?;
    Ok(tree)
}

// ============================================================================
// Quick Merge API
// ============================================================================
/// Merges the record files at `paths` into `base`, settling once at the end.
///
/// See [merge::merge_files] for full documentation.
pub fn merge_record_files<P: AsRef<Path>>(base: VascularTree, paths: &[P]) -> Result<VascularTree, MergeError> {
    merge::merge_files(base, paths)
}
