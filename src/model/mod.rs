//! Data model for binary vascular trees.
//!
//! # Tree representation
//! Trees are represented by [VascularTree], which uses the arena pattern to
//! store [Vessel] segments referenced by [VesselIndex]. Each vessel is either
//! a terminal (leaf) or bifurcates into exactly two children; the parent is
//! a non-owning index.
//!
//! | Quantity | Stored on | Meaning |
//! |----------|-----------|---------|
//! | `beta` | [Vessel] | radius relative to the parent's radius (absolute at the root) |
//! | `radius` | [Vessel] | `beta * parent.radius` |
//! | `resistance` | [Vessel] | reduced resistance of the subtree rooted at the vessel |
//! | `flow` | [Vessel] | sum of the terminal flows below |
//! | `subtree_volume` | [Vessel] | intravascular volume of the subtree |
//!
//! # Building trees
//! [VascularTreeBuilder] creates an empty tree; [VascularTree::add_root]
//! seeds it and [VascularTree::insert] splits a vessel to attach a new
//! terminal, settling the tree afterwards. Level-dependent constraints are
//! supplied as [TreeConstraints].

pub mod constraints;
pub mod point;
pub mod tree;
pub mod vessel;

pub use constraints::{ConstantFunction, LevelFunction, PiecewiseFunction, TreeConstraints};
pub use point::{BoundingBox, Point, to_bits};
pub use tree::{TreeError, VascularTree, VascularTreeBuilder};
pub use vessel::{BranchingMode, FunctionTag, Stage, Vessel, VesselId, VesselIndex};
