//! Cost functions minimized when placing a new terminal.

use crate::model::tree::VascularTree;
use crate::model::vessel::Vessel;
use std::fmt;

/// Additive per-vessel cost of a tree.
///
/// Costs must be sums over vessels, so that the cost of a partially cloned
/// tree can be combined with the unchanged remainder of the committed tree.
pub trait CostEstimator: Send + Sync + fmt::Debug {
    /// Returns the contribution of one vessel.
    fn vessel_cost(&self, vessel: &Vessel) -> f64;

    /// Returns the cost of the whole tree.
    fn tree_cost(&self, tree: &VascularTree) -> f64 {
        tree.vessels().iter().map(|vessel| self.vessel_cost(vessel)).sum()
    }
}

/// Intravascular volume, `pi r^2 L` per vessel. The classical CCO target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VolumetricCost;

impl CostEstimator for VolumetricCost {
    fn vessel_cost(&self, vessel: &Vessel) -> f64 {
        vessel.volume()
    }
}

/// Generalized power cost `L^length_exponent * r^radius_exponent` per vessel.
///
/// `PowerCost::new(1, 2)` is proportional to [VolumetricCost].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerCost {
    length_exponent: i32,
    radius_exponent: i32,
}

impl PowerCost {
    pub fn new(length_exponent: i32, radius_exponent: i32) -> Self {
        PowerCost { length_exponent, radius_exponent }
    }
}

impl CostEstimator for PowerCost {
    fn vessel_cost(&self, vessel: &Vessel) -> f64 {
        vessel.length().powi(self.length_exponent) * vessel.radius().powi(self.radius_exponent)
    }
}
