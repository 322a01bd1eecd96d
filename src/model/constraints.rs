//! Level-dependent constraint functions consumed by the hydraulic solver and
//! the bifurcation search.
//!
//! Each constraint is a pure function of the bifurcation level of a vessel:
//!
//! | Function | Used for | Presets |
//! |----------|----------|---------|
//! | viscosity | tentative Poiseuille resistance of new vessels | [TreeConstraints::constant_viscosity] |
//! | bifurcation exponent | sibling radius law | 3.0 (Murray), two-level 2.55 / 3.0 |
//! | symmetry lower bound | rejecting asymmetric bifurcations | none, 0.3, 0.4 below level 6 |
//!
//! Any `Fn(u32) -> f64 + Send + Sync` closure is a [LevelFunction] too.

use std::fmt;
use std::sync::Arc;

/// Level below which the two-level presets use their first value.
const PRESET_LEVEL_BREAK: u32 = 6;

// =#========================================================================#=
// LEVEL FUNCTION (Trait)
// =#========================================================================#=
/// Scalar function of a vessel's bifurcation level.
pub trait LevelFunction: Send + Sync {
    /// Returns the value of the function at `level`.
    fn value(&self, level: u32) -> f64;
}

impl<F> LevelFunction for F
where
    F: Fn(u32) -> f64 + Send + Sync,
{
    fn value(&self, level: u32) -> f64 {
        self(level)
    }
}

/// Constant function, independent of level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantFunction(pub f64);

impl LevelFunction for ConstantFunction {
    fn value(&self, _level: u32) -> f64 {
        self.0
    }
}

/// Piecewise constant function over level intervals.
///
/// Piece `i` covers the levels `lower_bounds[i] ..lower_bounds[i + 1]`;
/// the last piece is unbounded above. Levels below the first bound use the
/// first piece.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseFunction {
    values: Vec<f64>,
    lower_bounds: Vec<u32>,
}

impl PiecewiseFunction {
    /// Creates a piecewise constant function.
    ///
    /// # Arguments
    /// * `values` - Value of each piece
    /// * `lower_bounds` - Ascending lower level bound of each piece
    ///
    /// # Panics
    /// Panics if the vectors are empty or differ in length.
    pub fn new(values: Vec<f64>, lower_bounds: Vec<u32>) -> Self {
        assert!(!values.is_empty(), "piecewise function needs at least one piece");
        assert_eq!(values.len(), lower_bounds.len());
        PiecewiseFunction { values, lower_bounds }
    }
}

impl LevelFunction for PiecewiseFunction {
    fn value(&self, level: u32) -> f64 {
        let pieces = self.lower_bounds.iter().take_while(|&&bound| level >= bound).count();
        self.values[pieces.saturating_sub(1)]
    }
}

// =#========================================================================#=
// TREE CONSTRAINTS
// =#========================================================================#=
/// Bundle of the three level functions a tree is grown under.
///
/// Cheap to clone; the functions are shared behind [Arc]s so that speculative
/// clones of a tree evaluated on worker threads all see the same functions.
#[derive(Clone)]
pub struct TreeConstraints {
    viscosity: Arc<dyn LevelFunction>,
    bifurcation_exponent: Arc<dyn LevelFunction>,
    symmetry_lower_bound: Arc<dyn LevelFunction>,
}

impl TreeConstraints {
    /// Creates a constraint bundle from three level functions.
    ///
    /// The bifurcation exponent must never evaluate to zero.
    pub fn new(
        viscosity: impl LevelFunction + 'static,
        bifurcation_exponent: impl LevelFunction + 'static,
        symmetry_lower_bound: impl LevelFunction + 'static,
    ) -> Self {
        TreeConstraints {
            viscosity: Arc::new(viscosity),
            bifurcation_exponent: Arc::new(bifurcation_exponent),
            symmetry_lower_bound: Arc::new(symmetry_lower_bound),
        }
    }

    /// Constant blood viscosity of 0.036 P.
    pub fn constant_viscosity() -> ConstantFunction {
        ConstantFunction(0.036)
    }

    /// Murray's law exponent 3 at every level.
    pub fn murray_exponent() -> ConstantFunction {
        ConstantFunction(3.0)
    }

    /// Exponent 2.55 for the first levels, 3 afterwards.
    pub fn two_level_exponent() -> PiecewiseFunction {
        PiecewiseFunction::new(vec![2.55, 3.0], vec![0, PRESET_LEVEL_BREAK])
    }

    /// No symmetry restriction.
    pub fn no_symmetry() -> ConstantFunction {
        ConstantFunction(0.0)
    }

    /// Symmetry lower bound of 0.3 at every level.
    pub fn constant_symmetry() -> ConstantFunction {
        ConstantFunction(0.3)
    }

    /// Symmetry lower bound of 0.4 for the first levels, none afterwards.
    pub fn variable_symmetry() -> PiecewiseFunction {
        PiecewiseFunction::new(vec![0.4, 0.0], vec![0, PRESET_LEVEL_BREAK])
    }

    /// Viscosity at `level`.
    pub fn viscosity(&self, level: u32) -> f64 {
        self.viscosity.value(level)
    }

    /// Bifurcation exponent at `level`.
    pub fn bifurcation_exponent(&self, level: u32) -> f64 {
        self.bifurcation_exponent.value(level)
    }

    /// Minimum allowed ratio between sibling radii at `level`.
    pub fn symmetry_lower_bound(&self, level: u32) -> f64 {
        self.symmetry_lower_bound.value(level)
    }
}

impl Default for TreeConstraints {
    /// Constant viscosity, Murray exponent, no symmetry restriction.
    fn default() -> Self {
        TreeConstraints::new(
            TreeConstraints::constant_viscosity(),
            TreeConstraints::murray_exponent(),
            TreeConstraints::no_symmetry(),
        )
    }
}

impl fmt::Debug for TreeConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConstraints")
            .field("viscosity(0)", &self.viscosity(0))
            .field("bifurcation_exponent(0)", &self.bifurcation_exponent(0))
            .field("symmetry_lower_bound(0)", &self.symmetry_lower_bound(0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piecewise_lookup() {
        let function = PiecewiseFunction::new(vec![1.0, 2.0, 3.0], vec![2, 4, 10]);
        assert_eq!(function.value(0), 1.0);
        assert_eq!(function.value(2), 1.0);
        assert_eq!(function.value(4), 2.0);
        assert_eq!(function.value(9), 2.0);
        assert_eq!(function.value(10), 3.0);
        assert_eq!(function.value(500), 3.0);
    }

    #[test]
    fn test_presets() {
        assert_eq!(TreeConstraints::two_level_exponent().value(5), 2.55);
        assert_eq!(TreeConstraints::two_level_exponent().value(6), 3.0);
        assert_eq!(TreeConstraints::variable_symmetry().value(0), 0.4);
        assert_eq!(TreeConstraints::variable_symmetry().value(7), 0.0);
    }

    #[test]
    fn test_closure_as_level_function() {
        let constraints = TreeConstraints::new(
            TreeConstraints::constant_viscosity(),
            |level: u32| if level < 2 { 2.0 } else { 3.0 },
            TreeConstraints::no_symmetry(),
        );
        assert_eq!(constraints.bifurcation_exponent(1), 2.0);
        assert_eq!(constraints.bifurcation_exponent(2), 3.0);
    }
}
