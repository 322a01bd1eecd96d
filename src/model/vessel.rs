//! Vessel module for the segments of a vascular tree.

use crate::model::point::Point;
use std::f64::consts::PI;

/// Index of a vessel in a tree (arena).
pub type VesselIndex = usize;

/// Monotonically assigned identifier of a vessel, unique within a tree.
pub type VesselId = u64;

/// Growth stage during which a vessel was created.
pub type Stage = i32;

/// Functional tag of a vessel, carried through insertion records.
pub type FunctionTag = i32;

/// How a vessel may be used as parent when inserting a new terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingMode {
    /// Bifurcation may be placed anywhere in the triangle spanned by the
    /// vessel's endpoints and the new terminal.
    #[default]
    Deformable,
    /// Bifurcation must lie on the vessel's own segment.
    Rigid,
    /// Vessel is never split.
    NoBranching,
}

// =#========================================================================#=
// VESSEL
// =#========================================================================#=
/// One straight segment of a vascular tree.
///
/// A vessel is either a leaf (no children) or bifurcates into exactly two
/// children. The parent handle is non-owning; the tree arena owns all vessels.
///
/// # Invariants
/// - `index` is the position in the tree arena
/// - `parent` is `None` exactly for the root
/// - `children` is either `None` or a pair of distinct indices
/// - `radius == beta * parent.radius`, and `radius == beta` at the root
/// - `resistance` is *reduced*, i.e. without the `r^-4` factor
#[derive(Debug, Clone, PartialEq)]
pub struct Vessel {
    pub(crate) index: VesselIndex,
    pub(crate) id: VesselId,
    pub(crate) proximal: Point,
    pub(crate) distal: Point,
    pub(crate) level: u32,
    pub(crate) length: f64,
    pub(crate) beta: f64,
    pub(crate) radius: f64,
    pub(crate) resistance: f64,
    pub(crate) viscosity: f64,
    pub(crate) flow: f64,
    pub(crate) pressure: f64,
    pub(crate) subtree_volume: f64,
    pub(crate) stage: Stage,
    pub(crate) function: FunctionTag,
    pub(crate) branching_mode: BranchingMode,
    pub(crate) parent: Option<VesselIndex>,
    pub(crate) children: Option<(VesselIndex, VesselIndex)>,
}

impl Vessel {
    /// Creates a detached leaf vessel with unset hydraulic state.
    ///
    /// # Arguments
    /// * `index` - Position of this vessel in the tree arena
    /// * `id` - Identifier assigned by the tree
    /// * `proximal` - Upstream endpoint
    /// * `distal` - Downstream endpoint
    /// * `level` - Bifurcation level (root = 0)
    pub(crate) fn new(
        index: VesselIndex,
        id: VesselId,
        proximal: Point,
        distal: Point,
        level: u32,
    ) -> Self {
        Vessel {
            index,
            id,
            proximal,
            distal,
            level,
            length: proximal.distance(distal),
            beta: 0.0,
            radius: 0.0,
            resistance: 0.0,
            viscosity: 0.0,
            flow: 0.0,
            pressure: 0.0,
            subtree_volume: 0.0,
            stage: 0,
            function: 0,
            branching_mode: BranchingMode::default(),
            parent: None,
            children: None,
        }
    }

    /// Returns the index of this vessel in its tree.
    pub fn index(&self) -> VesselIndex {
        self.index
    }

    /// Returns the identifier of this vessel.
    pub fn id(&self) -> VesselId {
        self.id
    }

    /// Returns the upstream endpoint.
    pub fn proximal(&self) -> Point {
        self.proximal
    }

    /// Returns the downstream endpoint.
    pub fn distal(&self) -> Point {
        self.distal
    }

    /// Returns the bifurcation level (root = 0).
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Returns the Euclidean length of the segment.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Returns the radius-scaling factor relative to the parent's radius.
    /// For the root this is its absolute radius.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Returns the absolute radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the reduced hydraulic resistance of the subtree rooted here.
    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Returns the local viscosity sample.
    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    /// Returns the volumetric flow.
    pub fn flow(&self) -> f64 {
        self.flow
    }

    /// Returns the pressure at the proximal end.
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Returns the intravascular volume of the subtree rooted at this vessel.
    pub fn subtree_volume(&self) -> f64 {
        self.subtree_volume
    }

    /// Returns the stage during which this vessel was created.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the functional tag.
    pub fn function(&self) -> FunctionTag {
        self.function
    }

    /// Returns the branching mode.
    pub fn branching_mode(&self) -> BranchingMode {
        self.branching_mode
    }

    /// Sets the branching mode.
    pub fn set_branching_mode(&mut self, mode: BranchingMode) {
        self.branching_mode = mode;
    }

    /// Returns the index of the parent, or `None` for the root.
    pub fn parent_index(&self) -> Option<VesselIndex> {
        self.parent
    }

    /// Returns the indices of both children, or `None` for a leaf.
    pub fn children(&self) -> Option<(VesselIndex, VesselIndex)> {
        self.children
    }

    /// Returns whether this vessel is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns whether this vessel is a terminal (leaf).
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Returns the volume of this segment alone, `pi r^2 L`.
    pub fn volume(&self) -> f64 {
        PI * self.radius * self.radius * self.length
    }

    /// Returns `length - 2 * radius`; negative for vessels wider than long.
    pub fn geometric_residual(&self) -> f64 {
        self.length - 2.0 * self.radius
    }

    /// Returns the endpoint pair `(proximal, distal)`.
    pub fn segment(&self) -> (Point, Point) {
        (self.proximal, self.distal)
    }

    pub(crate) fn set_distal(&mut self, distal: Point) {
        self.distal = distal;
        self.length = self.proximal.distance(distal);
    }
}
