//! Growth of vascular trees by constrained constructive optimization.
//!
//! # Overview
//! A [TreeGenerator] repeatedly draws a terminal point from a [Domain] and
//! asks the bifurcation search ([test_vessel]) for the cheapest way to attach
//! it to each nearby vessel. The winning placement is committed with
//! [VascularTree::insert](crate::model::VascularTree::insert), which settles
//! the tree hydraulically.
//!
//! | Piece | Role |
//! |-------|------|
//! | [GrowthConfig] | grid resolution, angle limits, draw limits, parallelism |
//! | [CostEstimator] | the quantity being minimized, [VolumetricCost] by default |
//! | [Domain] | random terminal points, membership, distance limits |
//! | [search] | candidate grid, validity checks and speculative evaluation |
//! | [TreeGenerator] | root and terminal placement, optional recording |
//!
//! # Example
//! ```
//! use vascular_cco::growth::{BoxDomain, GrowthConfig, TreeGenerator};
//! use vascular_cco::model::{Point, VascularTreeBuilder};
//!
//! let domain = BoxDomain::new(Point::new(-1.0, 0.0, 0.0), Point::new(1.0, 2.0, 0.0), 42);
//! let config = GrowthConfig::builder().with_bifurcation_tests(5).build()?;
//! let mut tree = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 1.0).build();
//!
//! let mut generator = TreeGenerator::new(domain, config);
//! generator.grow(&mut tree, 4)?;
//! assert_eq!(tree.num_terminals(), 4);
//! assert!(tree.is_valid());
//! # Ok::<(), vascular_cco::growth::GrowthError>(())
//! ```

pub mod config;
pub mod cost;
pub mod domain;
pub mod generator;
pub mod search;

pub use config::{GrowthConfig, GrowthConfigBuilder};
pub use cost::{CostEstimator, PowerCost, VolumetricCost};
pub use domain::{BoxDomain, Domain};
pub use generator::TreeGenerator;
pub use search::{Placement, candidate_cost, evaluate, test_vessel};

use crate::hydraulics::SolverError;
use crate::model::tree::TreeError;
use thiserror::Error;

/// Failure of configuration or growth.
#[derive(Debug, Error)]
pub enum GrowthError {
    #[error("invalid growth configuration: {0}")]
    InvalidConfig(String),

    #[error("no valid terminal found after {attempts} attempts with {terminals} terminals placed")]
    Exhausted { terminals: usize, attempts: usize },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}
