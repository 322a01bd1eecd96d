//! Tree module for vascular tree representation.
//!
//! This module provides the core aggregate of the crate:
//! - [VascularTree]: arena of [Vessel]s plus inlet data, solver settings,
//!   counters and a [SegmentIndex] over all segments.
//! - [VascularTreeBuilder]: configures and creates empty trees.
//! - [TreeError]: structural precondition violations.

use crate::hydraulics::{self, LengthUnit, SolverError};
use crate::model::constraints::TreeConstraints;
use crate::model::point::{BoundingBox, Point};
use crate::model::vessel::{BranchingMode, FunctionTag, Stage, Vessel, VesselId, VesselIndex};
use crate::spatial::SegmentIndex;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

/// Points closer than this are considered coincident when splitting.
const COINCIDENCE_TOLERANCE: f64 = 1e-12;

/// Index for unset root, i.e. empty tree.
const NO_ROOT_SET_INDEX: VesselIndex = usize::MAX;

const DEFAULT_ROOT_RADIUS: f64 = 1.0;
const DEFAULT_TOLERANCE: f64 = 1e-6;
const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Structural precondition violation on a tree operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("tree has no root")]
    EmptyTree,

    #[error("tree already has a root")]
    RootAlreadySet,

    #[error("no vessel at index {0}")]
    UnknownVessel(VesselIndex),

    #[error("vessel {0} is not a split target")]
    NotSplittable(VesselIndex),

    #[error("degenerate bifurcation at {0}")]
    DegenerateBifurcation(Point),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

// =#========================================================================#=
// TREE BUILDER
// =#========================================================================#=
/// Builder for an empty [VascularTree].
///
/// # Example
/// ```
/// use vascular_cco::model::{Point, VascularTreeBuilder};
///
/// let mut tree = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 8.0)
///     .with_root_radius(0.5)
///     .with_tolerance(1e-8)
///     .build();
/// tree.add_root(Point::new(0.0, 10.0, 0.0)).unwrap();
/// assert_eq!(tree.num_terminals(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct VascularTreeBuilder {
    inlet: Point,
    inlet_flow: f64,
    root_radius: f64,
    reference_pressure: f64,
    tolerance: f64,
    max_iterations: usize,
    length_unit: LengthUnit,
    constraints: TreeConstraints,
}

impl VascularTreeBuilder {
    /// Starts configuring a tree perfused from `inlet` with total `inlet_flow`.
    pub fn new(inlet: Point, inlet_flow: f64) -> Self {
        VascularTreeBuilder {
            inlet,
            inlet_flow,
            root_radius: DEFAULT_ROOT_RADIUS,
            reference_pressure: 0.0,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            length_unit: LengthUnit::default(),
            constraints: TreeConstraints::default(),
        }
    }

    /// Sets the absolute radius of the root vessel.
    pub fn with_root_radius(mut self, radius: f64) -> Self {
        self.root_radius = radius;
        self
    }

    /// Sets the pressure at the terminals.
    pub fn with_reference_pressure(mut self, pressure: f64) -> Self {
        self.reference_pressure = pressure;
        self
    }

    /// Sets the maximum beta change accepted as converged.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration cap of the fixed point.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the unit of all coordinates.
    pub fn with_length_unit(mut self, unit: LengthUnit) -> Self {
        self.length_unit = unit;
        self
    }

    /// Sets the level-dependent constraint functions.
    pub fn with_constraints(mut self, constraints: TreeConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Creates the empty tree.
    pub fn build(self) -> VascularTree {
        VascularTree {
            vessels: Vec::new(),
            root_index: NO_ROOT_SET_INDEX,
            inlet: self.inlet,
            inlet_flow: self.inlet_flow,
            root_radius: self.root_radius,
            reference_pressure: self.reference_pressure,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            length_unit: self.length_unit,
            constraints: self.constraints,
            num_terminals: 0,
            next_id: 0,
            current_stage: 0,
            segment_index: SegmentIndex::new(),
        }
    }
}

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A binary vascular tree represented using the arena pattern on [Vessel].
///
/// # Structure
/// - Vessels are stored in creation order and referenced by [VesselIndex]
/// - Exactly one root, connected to the inlet
/// - Every vessel is a leaf or has exactly two children
/// - A [SegmentIndex] over all segments is kept in sync with every change
///
/// # Construction
/// Create with [VascularTreeBuilder], seed with [VascularTree::add_root],
/// then grow with [VascularTree::insert]. Committed trees are always
/// hydraulically settled (see [crate::hydraulics]).
#[derive(Debug)]
pub struct VascularTree {
    vessels: Vec<Vessel>,
    root_index: VesselIndex,
    inlet: Point,
    inlet_flow: f64,
    root_radius: f64,
    reference_pressure: f64,
    tolerance: f64,
    max_iterations: usize,
    length_unit: LengthUnit,
    constraints: TreeConstraints,
    num_terminals: usize,
    next_id: VesselId,
    current_stage: Stage,
    segment_index: SegmentIndex,
}

// ============================================================================
// Getters / Accessors, etc. (pub)
// ============================================================================
impl VascularTree {
    /// Returns whether the tree has no vessels yet.
    pub fn is_empty(&self) -> bool {
        self.root_index == NO_ROOT_SET_INDEX
    }

    /// Returns the index of the root, or `None` for an empty tree.
    pub fn root_index(&self) -> Option<VesselIndex> {
        (!self.is_empty()).then_some(self.root_index)
    }

    /// Returns a reference to the root vessel.
    ///
    /// # Panics
    /// Panics if the tree is empty.
    pub fn root(&self) -> &Vessel {
        &self[self.root_index]
    }

    /// Returns the vessel at `index`, or `None` if out of bounds.
    pub fn vessel(&self, index: VesselIndex) -> Option<&Vessel> {
        self.vessels.get(index)
    }

    /// Returns the vessel at `index` mutably, or `None` if out of bounds.
    ///
    /// Only non-structural fields are exposed through [Vessel]'s setters.
    pub fn vessel_mut(&mut self, index: VesselIndex) -> Option<&mut Vessel> {
        self.vessels.get_mut(index)
    }

    /// Returns all vessels in creation order.
    pub fn vessels(&self) -> &[Vessel] {
        &self.vessels
    }

    /// Returns the number of vessels.
    pub fn num_vessels(&self) -> usize {
        self.vessels.len()
    }

    /// Returns the number of terminals (leaves).
    pub fn num_terminals(&self) -> usize {
        self.num_terminals
    }

    /// Returns the inlet point.
    pub fn inlet(&self) -> Point {
        self.inlet
    }

    /// Returns the total inlet flow.
    pub fn inlet_flow(&self) -> f64 {
        self.inlet_flow
    }

    /// Returns the flow every terminal carries, `inlet_flow / num_terminals`.
    pub fn terminal_flow(&self) -> f64 {
        self.inlet_flow / self.num_terminals as f64
    }

    /// Returns the configured root radius.
    pub fn root_radius(&self) -> f64 {
        self.root_radius
    }

    /// Returns the pressure at the terminals.
    pub fn reference_pressure(&self) -> f64 {
        self.reference_pressure
    }

    /// Returns the pressure drop from the inlet to the terminals.
    pub fn pressure_drop(&self) -> f64 {
        match self.root_index() {
            Some(root) => self[root].pressure - self.reference_pressure,
            None => 0.0,
        }
    }

    /// Returns the convergence tolerance of the fixed point.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the iteration cap of the fixed point.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the unit of all coordinates.
    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    /// Returns the level-dependent constraint functions.
    pub fn constraints(&self) -> &TreeConstraints {
        &self.constraints
    }

    /// Returns the stage new terminals are tagged with.
    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    /// Sets the stage new terminals are tagged with.
    pub fn set_current_stage(&mut self, stage: Stage) {
        self.current_stage = stage;
    }

    /// Returns the spatial index over all segments.
    pub fn segment_index(&self) -> &SegmentIndex {
        &self.segment_index
    }

    /// Returns the on-tree point closest to `point` and its distance.
    pub fn nearest_point(&self, point: Point) -> Option<(Point, f64)> {
        self.segment_index.nearest_point(point).map(|(closest, distance, _)| (closest, distance))
    }

    /// Returns the vessels whose segments lie near `bounding_box`.
    pub fn vessels_within_box(&self, bounding_box: &BoundingBox) -> Vec<VesselIndex> {
        self.segment_index.segments_within_box(bounding_box)
    }

    /// Returns the intravascular volume, sum of `pi r^2 L` over all vessels.
    pub fn total_volume(&self) -> f64 {
        self.vessels.iter().map(Vessel::volume).sum()
    }

    /// Returns the growth cost of the tree, i.e. its intravascular volume.
    pub fn total_cost(&self) -> f64 {
        self.total_volume()
    }

    /// Validates the tree structure and all index references.
    ///
    /// Checks:
    /// - Root index is valid and the root has no parent
    /// - All vessel indices match their position in the arena
    /// - Children are in bounds, distinct and point back to their parent
    /// - Non-roots have a parent listing them as a child
    /// - Every vessel is reachable from the root
    /// - Terminal count matches the number of leaves
    /// - The segment index holds exactly one entry per vessel
    ///
    /// # Returns
    /// `true` if tree is valid, `false` otherwise
    pub fn is_valid(&self) -> bool {
        if self.is_empty() {
            return self.vessels.is_empty() && self.num_terminals == 0;
        }
        if self.root_index >= self.vessels.len() || !self.vessels[self.root_index].is_root() {
            return false;
        }

        let mut leaf_count = 0;
        for (index, vessel) in self.vessels.iter().enumerate() {
            if vessel.index != index {
                return false;
            }

            match vessel.children {
                None => leaf_count += 1,
                Some((left, right)) => {
                    if left == right || left >= self.vessels.len() || right >= self.vessels.len() {
                        return false;
                    }
                    if self.vessels[left].parent != Some(index) || self.vessels[right].parent != Some(index) {
                        return false;
                    }
                }
            }

            match vessel.parent {
                None if index != self.root_index => return false,
                None => {}
                Some(parent) => {
                    let listed = self
                        .vessels
                        .get(parent)
                        .and_then(Vessel::children)
                        .is_some_and(|(left, right)| left == index || right == index);
                    if !listed {
                        return false;
                    }
                }
            }
        }

        leaf_count == self.num_terminals
            && self.pre_order_iter().count() == self.vessels.len()
            && self.segment_index.len() == self.vessels.len()
    }

    /// Checks flow conservation and resistance consistency of a settled tree.
    ///
    /// Every terminal carries [VascularTree::terminal_flow], every bifurcation
    /// carries the sum of its children's flows, and every resistance equals
    /// the own Poiseuille term plus the parallel combination of the children's
    /// beta-scaled resistances, all to within relative `tolerance`.
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tolerance * a.abs().max(b.abs()).max(1.0);
        let terminal_flow = self.terminal_flow();

        self.vessels.iter().all(|vessel| {
            let local = hydraulics::poiseuille_resistance(vessel.viscosity, vessel.length);
            match vessel.children {
                None => close(vessel.flow, terminal_flow) && close(vessel.resistance, local),
                Some((left, right)) => {
                    let (left, right) = (&self[left], &self[right]);
                    let contribution = left.beta.powi(4) / left.resistance + right.beta.powi(4) / right.resistance;
                    close(vessel.flow, left.flow + right.flow) && close(vessel.resistance, local + 1.0 / contribution)
                }
            }
        })
    }

    /// Returns an iterator over the tree in post-order (children before parents).
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter::new(self)
    }

    /// Returns an iterator over the tree in pre-order (parents before children).
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }

    /// Returns an iterator over the tree in breadth-first order (level by level).
    pub fn breadth_first_iter(&self) -> BreadthFirstIter<'_> {
        BreadthFirstIter::new(self)
    }

    pub(crate) fn post_order_indices(&self) -> Vec<VesselIndex> {
        self.post_order_iter().map(Vessel::index).collect()
    }

    pub(crate) fn pre_order_indices(&self) -> Vec<VesselIndex> {
        self.pre_order_iter().map(Vessel::index).collect()
    }
}

impl std::ops::Index<VesselIndex> for VascularTree {
    type Output = Vessel;

    fn index(&self, index: VesselIndex) -> &Self::Output {
        &self.vessels[index]
    }
}

impl std::ops::IndexMut<VesselIndex> for VascularTree {
    fn index_mut(&mut self, index: VesselIndex) -> &mut Self::Output {
        &mut self.vessels[index]
    }
}

// ============================================================================
// Growth: root, split, insert (pub)
// ============================================================================
impl VascularTree {
    /// Creates the root vessel from the inlet to the first terminal and settles it.
    ///
    /// The root's beta is the configured root radius and its flow the whole
    /// inlet flow.
    ///
    /// # Errors
    /// [TreeError::RootAlreadySet] if the tree is not empty,
    /// [TreeError::DegenerateBifurcation] if `terminal` coincides with the inlet.
    pub fn add_root(&mut self, terminal: Point) -> Result<VesselIndex, TreeError> {
        if !self.is_empty() {
            return Err(TreeError::RootAlreadySet);
        }
        if self.inlet.distance(terminal) <= COINCIDENCE_TOLERANCE {
            return Err(TreeError::DegenerateBifurcation(terminal));
        }

        let id = self.take_id();
        let mut root = Vessel::new(0, id, self.inlet, terminal, 0);
        root.beta = self.root_radius;
        root.radius = self.root_radius;
        root.viscosity = self.constraints.viscosity(0);
        root.resistance = hydraulics::poiseuille_resistance(root.viscosity, root.length);
        root.flow = self.inlet_flow;
        root.subtree_volume = root.volume();
        root.pressure = root.resistance * root.flow + self.reference_pressure;
        root.stage = self.current_stage;

        self.segment_index.insert(0, root.proximal, root.distal);
        self.vessels.push(root);
        self.root_index = 0;
        self.num_terminals = 1;

        hydraulics::settle(self)?;
        info!(terminal = %terminal, "root created");
        Ok(0)
    }

    /// Splits `parent` at `bifurcation` and attaches a new terminal at `new_point`.
    ///
    /// The parent keeps its proximal point and now ends at `bifurcation`. A
    /// new vessel `iCon` takes over the parent's former distal point and
    /// children; a new terminal vessel `iNew` runs from `bifurcation` to
    /// `new_point`. Both receive tentative Poiseuille resistances; the tree is
    /// *not* settled afterwards (see [VascularTree::insert]).
    ///
    /// # Arguments
    /// * `parent` - Index of the vessel to split
    /// * `bifurcation` - New distal point of `parent`
    /// * `new_point` - Distal point of the new terminal
    /// * `function` - Functional tag of the new terminal
    ///
    /// # Returns
    /// Indices `(iCon, iNew)` of the two new vessels.
    ///
    /// # Errors
    /// [TreeError::UnknownVessel], [TreeError::NotSplittable] for vessels
    /// with [BranchingMode::NoBranching],
    /// [TreeError::DegenerateBifurcation] if `bifurcation` coincides with an
    /// endpoint of `parent` or with `new_point`.
    pub fn split(
        &mut self,
        parent: VesselIndex,
        bifurcation: Point,
        new_point: Point,
        function: FunctionTag,
    ) -> Result<(VesselIndex, VesselIndex), TreeError> {
        let vessel = self.vessels.get(parent).ok_or(TreeError::UnknownVessel(parent))?;
        if vessel.branching_mode == BranchingMode::NoBranching {
            return Err(TreeError::NotSplittable(parent));
        }
        let coincides = |point: Point| bifurcation.distance(point) <= COINCIDENCE_TOLERANCE;
        if coincides(vessel.proximal) || coincides(vessel.distal) || coincides(new_point) {
            return Err(TreeError::DegenerateBifurcation(bifurcation));
        }

        let level = vessel.level + 1;
        let (old_proximal, old_distal) = vessel.segment();
        let former_children = vessel.children;
        let (parent_stage, parent_function, parent_mode) = (vessel.stage, vessel.function, vessel.branching_mode);
        let (parent_beta, parent_radius, parent_flow) = (vessel.beta, vessel.radius, vessel.flow);

        let connection_index = self.vessels.len();
        let new_index = connection_index + 1;
        let viscosity = self.constraints.viscosity(level);

        let connection_id = self.take_id();
        let mut connection = Vessel::new(connection_index, connection_id, bifurcation, old_distal, level);
        connection.viscosity = viscosity;
        connection.resistance = hydraulics::poiseuille_resistance(viscosity, connection.length);
        connection.beta = parent_beta;
        connection.radius = parent_radius;
        connection.flow = parent_flow;
        connection.stage = parent_stage;
        connection.function = parent_function;
        connection.branching_mode = parent_mode;
        connection.parent = Some(parent);
        connection.children = former_children;

        let new_id = self.take_id();
        let mut terminal = Vessel::new(new_index, new_id, bifurcation, new_point, level);
        terminal.viscosity = viscosity;
        terminal.resistance = hydraulics::poiseuille_resistance(viscosity, terminal.length);
        terminal.radius = parent_radius;
        terminal.stage = self.current_stage;
        terminal.function = function;
        terminal.parent = Some(parent);

        if let Some((left, right)) = former_children {
            self.vessels[left].parent = Some(connection_index);
            self.vessels[right].parent = Some(connection_index);
        }
        let shrunk = &mut self.vessels[parent];
        shrunk.set_distal(bifurcation);
        shrunk.children = Some((connection_index, new_index));

        self.segment_index.remove(parent, old_proximal, old_distal);
        self.segment_index.insert(parent, old_proximal, bifurcation);
        self.segment_index.insert(connection_index, bifurcation, old_distal);
        self.segment_index.insert(new_index, bifurcation, new_point);

        self.vessels.push(connection);
        self.vessels.push(terminal);
        self.num_terminals += 1;

        debug!(parent, bifurcation = %bifurcation, new_point = %new_point, "vessel split");
        Ok((connection_index, new_index))
    }

    /// Splits `parent` like [VascularTree::split] and settles the tree.
    ///
    /// The insertion is atomic: if the solver fails, the tree is restored to
    /// its state before the call.
    ///
    /// # Errors
    /// Any error of [VascularTree::split], or [TreeError::Solver].
    pub fn insert(
        &mut self,
        parent: VesselIndex,
        bifurcation: Point,
        new_point: Point,
        function: FunctionTag,
    ) -> Result<(VesselIndex, VesselIndex), TreeError> {
        let snapshot = (self.vessels.clone(), self.num_terminals, self.next_id);

        let inserted = self.split(parent, bifurcation, new_point, function)?;
        if let Err(err) = hydraulics::settle(self) {
            (self.vessels, self.num_terminals, self.next_id) = snapshot;
            self.rebuild_segment_index();
            return Err(err.into());
        }

        info!(
            parent,
            terminals = self.num_terminals,
            cost = self.total_cost(),
            "terminal inserted"
        );
        Ok(inserted)
    }

    /// Runs the hydraulic solver to convergence.
    ///
    /// # Returns
    /// Number of fixed-point iterations performed.
    pub fn settle(&mut self) -> Result<usize, SolverError> {
        hydraulics::settle(self)
    }
}

// ============================================================================
// Cloning
// ============================================================================
impl Clone for VascularTree {
    /// Deep-copies all vessels and rebuilds the segment index.
    fn clone(&self) -> Self {
        let mut copy = self.empty_like();
        copy.vessels = self.vessels.clone();
        copy.root_index = self.root_index;
        copy.num_terminals = self.num_terminals;
        copy.next_id = self.next_id;
        copy.rebuild_segment_index();
        copy
    }
}

impl VascularTree {
    /// Clones the subtree rooted `levels` ancestors above `vessel`.
    ///
    /// The subtree root becomes the root of the copy, with beta set to its
    /// absolute radius so that all radii below are preserved. Terminal count
    /// and inlet flow are those of the whole tree, so terminal flows are
    /// unchanged. With `levels` at least the depth of `vessel`, the copy
    /// equals [VascularTree::clone] up to vessel order.
    ///
    /// # Returns
    /// The copy and the index of `vessel` within it.
    ///
    /// # Errors
    /// [TreeError::UnknownVessel] if `vessel` is out of bounds.
    pub fn clone_up_to(&self, levels: usize, vessel: VesselIndex) -> Result<(VascularTree, VesselIndex), TreeError> {
        if vessel >= self.vessels.len() {
            return Err(TreeError::UnknownVessel(vessel));
        }

        let mut subtree_root = vessel;
        for _ in 0..levels {
            match self.vessels[subtree_root].parent {
                Some(parent) => subtree_root = parent,
                None => break,
            }
        }

        let mut copy = self.empty_like();
        copy.num_terminals = self.num_terminals;
        copy.next_id = self.next_id;

        let mut mapping = vec![NO_ROOT_SET_INDEX; self.vessels.len()];
        for original in SubtreePreOrder::new(self, subtree_root) {
            let mut cloned = original.clone();
            cloned.index = copy.vessels.len();
            mapping[original.index] = cloned.index;
            if original.index == subtree_root {
                cloned.beta = original.radius;
                cloned.parent = None;
            } else {
                cloned.parent = original.parent.map(|parent| mapping[parent]);
            }
            copy.vessels.push(cloned);
        }
        // children were pushed after their parents, so all are mapped now
        for cloned in copy.vessels.iter_mut() {
            cloned.children = cloned.children.map(|(left, right)| (mapping[left], mapping[right]));
        }

        copy.root_index = 0;
        copy.rebuild_segment_index();
        Ok((copy, mapping[vessel]))
    }

    /// Creates an empty tree with the same settings, constraints and stage.
    pub(crate) fn empty_like(&self) -> VascularTree {
        VascularTree {
            vessels: Vec::new(),
            root_index: NO_ROOT_SET_INDEX,
            inlet: self.inlet,
            inlet_flow: self.inlet_flow,
            root_radius: self.root_radius,
            reference_pressure: self.reference_pressure,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            length_unit: self.length_unit,
            constraints: self.constraints.clone(),
            num_terminals: 0,
            next_id: 0,
            current_stage: self.current_stage,
            segment_index: SegmentIndex::new(),
        }
    }

    /// Replaces the whole arena, e.g. after pruning. Indices inside `vessels`
    /// must already be consistent; the segment index is rebuilt.
    pub(crate) fn install_vessels(&mut self, vessels: Vec<Vessel>, root: VesselIndex, next_id: VesselId) {
        self.num_terminals = vessels.iter().filter(|vessel| vessel.is_leaf()).count();
        self.vessels = vessels;
        self.root_index = if self.vessels.is_empty() { NO_ROOT_SET_INDEX } else { root };
        self.next_id = next_id;
        self.rebuild_segment_index();
    }

    pub(crate) fn next_id(&self) -> VesselId {
        self.next_id
    }

    fn take_id(&mut self) -> VesselId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn rebuild_segment_index(&mut self) {
        self.segment_index = SegmentIndex::bulk_load(&self.vessels);
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Iterator for post-order traversal (children before parents).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
/// Each vessel is visited after all its descendants have been visited.
pub struct PostOrderIter<'a> {
    tree: &'a VascularTree,
    stack: Vec<(VesselIndex, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIter<'a> {
    fn new(tree: &'a VascularTree) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = tree.root_index() {
            stack.push((root, false));
        }
        PostOrderIter { tree, stack }
    }
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a Vessel;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            let vessel = &self.tree[index];

            match vessel.children {
                Some((left, right)) if !children_visited => {
                    self.stack.push((index, true));
                    // right first, so left is processed first
                    self.stack.push((right, false));
                    self.stack.push((left, false));
                }
                _ => return Some(vessel),
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
/// Each vessel is visited before any of its descendants.
pub struct PreOrderIter<'a> {
    inner: SubtreePreOrder<'a>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a VascularTree) -> Self {
        let inner = match tree.root_index() {
            Some(root) => SubtreePreOrder::new(tree, root),
            None => SubtreePreOrder { tree, stack: Vec::new() },
        };
        PreOrderIter { inner }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Vessel;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

struct SubtreePreOrder<'a> {
    tree: &'a VascularTree,
    stack: Vec<VesselIndex>,
}

impl<'a> SubtreePreOrder<'a> {
    fn new(tree: &'a VascularTree, start: VesselIndex) -> Self {
        SubtreePreOrder { tree, stack: vec![start] }
    }
}

impl<'a> Iterator for SubtreePreOrder<'a> {
    type Item = &'a Vessel;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let vessel = &self.tree[index];

        if let Some((left, right)) = vessel.children {
            self.stack.push(right);
            self.stack.push(left);
        }

        Some(vessel)
    }
}

/// Iterator for breadth-first traversal (level by level, starting at the root).
pub struct BreadthFirstIter<'a> {
    tree: &'a VascularTree,
    queue: VecDeque<VesselIndex>,
}

impl<'a> BreadthFirstIter<'a> {
    fn new(tree: &'a VascularTree) -> Self {
        let queue = tree.root_index().into_iter().collect();
        BreadthFirstIter { tree, queue }
    }
}

impl<'a> Iterator for BreadthFirstIter<'a> {
    type Item = &'a Vessel;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.queue.pop_front()?;
        let vessel = &self.tree[index];

        if let Some((left, right)) = vessel.children {
            self.queue.push_back(left);
            self.queue.push_back(right);
        }

        Some(vessel)
    }
}
