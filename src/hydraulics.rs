//! Hydraulic solver keeping a vascular tree consistent after structural changes.
//!
//! Two passes run after every split, prune or merge:
//!
//! 1. [update_tree]: one post-order pass recomputing levels, terminal flows,
//!    sibling betas and resistances from the current radii.
//! 2. [update_viscosities_beta]: one pass of the radius/viscosity fixed point.
//!    Radii follow from betas, viscosity follows from radius
//!    ([fahraeus_lindqvist_viscosity]), resistance from viscosity, and betas
//!    from resistance ratios. Returns the largest beta change.
//!
//! [settle] runs both until the largest beta change is within the tree's
//! tolerance, guarding against divergence.
//!
//! Resistances are *reduced*: `8 nu L / pi` without the `r^-4` factor, so that
//! the children of a bifurcation contribute `beta^4 / R` in parallel.

use crate::model::tree::VascularTree;
use crate::model::vessel::{Vessel, VesselIndex};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, warn};

/// Beta changes above this bound abort the fixed point as divergent.
pub const DIVERGENCE_THRESHOLD: f64 = 1.0e6;

/// Plasma viscosity in cP used by the in-vivo viscosity law.
const PLASMA_VISCOSITY: f64 = 1.1245;

/// Unit of all lengths of a tree, needed by the diameter-based viscosity law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[default]
    Millimeter,
    Centimeter,
}

/// Error of the radius/viscosity fixed point.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("fixed point diverged at iteration {iteration} (max beta variation {max_variation})")]
    Diverged { iteration: usize, max_variation: f64 },

    #[error("fixed point did not converge within {iterations} iterations (max beta variation {max_variation})")]
    NotConverged { iterations: usize, max_variation: f64 },
}

// ============================================================================
// Laws
// ============================================================================
/// Reduced Poiseuille resistance `8 nu L / pi` of a segment.
pub fn poiseuille_resistance(viscosity: f64, length: f64) -> f64 {
    8.0 * viscosity / PI * length
}

/// In-vivo blood viscosity (cP) for a vessel of the given radius.
///
/// Viscosity falls steeply for capillary-sized vessels and approaches a
/// constant for large ones. The diameter entering the law is in micrometres,
/// converted from `radius` according to `unit`.
pub fn fahraeus_lindqvist_viscosity(radius: f64, unit: LengthUnit) -> f64 {
    let mut diameter = radius * 2000.0;
    if unit == LengthUnit::Centimeter {
        diameter *= 10.0;
    }

    let mixture = 6.0 * (-0.085 * diameter).exp() - 2.44 * (-0.06 * diameter.powf(0.645)).exp() + 3.2;
    let relative = diameter / (diameter - 1.1);
    let relative_sqr = relative * relative;

    PLASMA_VISCOSITY * (1.0 + (mixture - 1.0) * relative_sqr) * relative_sqr
}

/// Betas of two siblings from the bifurcation-exponent law.
///
/// Each child's beta follows from the ratio of `flow * resistance` of its
/// sibling to its own, raised to the level-dependent exponent `gamma`.
fn sibling_betas(left: &Vessel, right: &Vessel, gamma_left: f64, gamma_right: f64) -> (f64, f64) {
    let left_product = left.flow * left.resistance;
    let right_product = right.flow * right.resistance;

    let beta = |own: f64, sibling: f64, gamma: f64| {
        let ratio = (sibling / own).sqrt().sqrt();
        (1.0 + ratio.powf(gamma)).powf(-1.0 / gamma)
    };

    (beta(left_product, right_product, gamma_left), beta(right_product, left_product, gamma_right))
}

fn parallel_contribution(tree: &VascularTree, left: VesselIndex, right: VesselIndex) -> f64 {
    let term = |index: VesselIndex| {
        let beta_sqr = tree[index].beta * tree[index].beta;
        beta_sqr * beta_sqr / tree[index].resistance
    };
    term(left) + term(right)
}

fn track_variation(max_variation: &mut f64, variation: f64) {
    if variation.is_nan() || variation > *max_variation {
        *max_variation = variation;
    }
}

// ============================================================================
// Passes
// ============================================================================
/// Flow/topology pass.
///
/// Sets levels top-down, then bottom-up assigns every terminal the uniform
/// share `inlet_flow / num_terminals`, sums flows, recomputes sibling betas
/// and resistances. Local Poiseuille terms use the level-dependent viscosity
/// constraint; terminal resistances are left as they are.
pub fn update_tree(tree: &mut VascularTree) {
    let constraints = tree.constraints().clone();

    for index in tree.pre_order_indices() {
        if let Some((left, right)) = tree[index].children {
            let level = tree[index].level + 1;
            tree[left].level = level;
            tree[right].level = level;
        }
    }

    let terminal_flow = tree.terminal_flow();
    for index in tree.post_order_indices() {
        let Some((left, right)) = tree[index].children else {
            tree[index].flow = terminal_flow;
            continue;
        };

        let (beta_left, beta_right) = sibling_betas(
            &tree[left],
            &tree[right],
            constraints.bifurcation_exponent(tree[left].level),
            constraints.bifurcation_exponent(tree[right].level),
        );
        tree[left].beta = beta_left;
        tree[right].beta = beta_right;

        let flow = tree[left].flow + tree[right].flow;
        let contribution = parallel_contribution(tree, left, right);
        let vessel = &mut tree[index];
        let local = poiseuille_resistance(constraints.viscosity(vessel.level), vessel.length);
        vessel.flow = flow;
        vessel.resistance = local + 1.0 / contribution;
    }
}

/// One pass of the radius/viscosity fixed point.
///
/// # Returns
/// The largest absolute beta change over all vessels (`NaN` if any beta
/// became undefined).
pub fn update_viscosities_beta(tree: &mut VascularTree) -> f64 {
    let constraints = tree.constraints().clone();
    let unit = tree.length_unit();
    let reference_pressure = tree.reference_pressure();

    for index in tree.pre_order_indices() {
        tree[index].radius = match tree[index].parent {
            Some(parent) => tree[index].beta * tree[parent].radius,
            None => tree[index].beta,
        };
    }

    let mut max_variation = 0.0;
    for index in tree.post_order_indices() {
        match tree[index].children {
            None => {
                let vessel = &mut tree[index];
                vessel.viscosity = fahraeus_lindqvist_viscosity(vessel.radius, unit);
                vessel.resistance = poiseuille_resistance(vessel.viscosity, vessel.length);
                vessel.subtree_volume = vessel.volume();
            }
            Some((left, right)) => {
                let (beta_left, beta_right) = sibling_betas(
                    &tree[left],
                    &tree[right],
                    constraints.bifurcation_exponent(tree[left].level),
                    constraints.bifurcation_exponent(tree[right].level),
                );
                track_variation(&mut max_variation, (beta_left - tree[left].beta).abs());
                track_variation(&mut max_variation, (beta_right - tree[right].beta).abs());
                tree[left].beta = beta_left;
                tree[right].beta = beta_right;

                let children_volume = tree[left].subtree_volume + tree[right].subtree_volume;
                let contribution = parallel_contribution(tree, left, right);
                let vessel = &mut tree[index];
                vessel.viscosity = fahraeus_lindqvist_viscosity(vessel.radius, unit);
                vessel.resistance = poiseuille_resistance(vessel.viscosity, vessel.length) + 1.0 / contribution;
                vessel.subtree_volume = vessel.volume() + children_volume;
            }
        }

        let vessel = &mut tree[index];
        let radius_sqr = vessel.radius * vessel.radius;
        vessel.pressure = vessel.resistance * vessel.flow / (radius_sqr * radius_sqr) + reference_pressure;
    }

    max_variation
}

/// Runs the flow pass once and the fixed point until convergence.
///
/// # Returns
/// Number of fixed-point iterations performed.
///
/// # Errors
/// [SolverError::Diverged] if the beta change becomes undefined or exceeds
/// [DIVERGENCE_THRESHOLD]; [SolverError::NotConverged] if the tree's
/// iteration cap is reached first. The tree is left unsettled in both cases.
pub fn settle(tree: &mut VascularTree) -> Result<usize, SolverError> {
    if tree.is_empty() {
        return Ok(0);
    }

    update_tree(tree);

    let mut iteration = 0;
    loop {
        let max_variation = update_viscosities_beta(tree);
        iteration += 1;

        if !max_variation.is_finite() || max_variation > DIVERGENCE_THRESHOLD {
            warn!(iteration, max_variation, "fixed point diverged");
            return Err(SolverError::Diverged { iteration, max_variation });
        }
        if max_variation <= tree.tolerance() {
            debug!(iterations = iteration, max_variation, "fixed point converged");
            return Ok(iteration);
        }
        if iteration >= tree.max_iterations() {
            warn!(iterations = iteration, max_variation, "fixed point hit iteration cap");
            return Err(SolverError::NotConverged { iterations: iteration, max_variation });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viscosity_decreases_towards_plateau() {
        let small = fahraeus_lindqvist_viscosity(0.005, LengthUnit::Millimeter);
        let medium = fahraeus_lindqvist_viscosity(0.05, LengthUnit::Millimeter);
        let large = fahraeus_lindqvist_viscosity(1.0, LengthUnit::Millimeter);
        assert!(small > medium);
        assert!(large > 0.0);
        // 1 mm in centimetre units is 0.1
        let in_cm = fahraeus_lindqvist_viscosity(0.1, LengthUnit::Centimeter);
        assert!((in_cm - large).abs() < 1e-12);
    }

    #[test]
    fn test_equal_siblings_share_murray_beta() {
        let mut left = Vessel::new(0, 0, Default::default(), Default::default(), 1);
        left.flow = 2.0;
        left.resistance = 3.0;
        let right = left.clone();
        let (beta_left, beta_right) = sibling_betas(&left, &right, 3.0, 3.0);
        let expected = 0.5_f64.powf(1.0 / 3.0);
        assert!((beta_left - expected).abs() < 1e-12);
        assert!((beta_right - expected).abs() < 1e-12);
    }

    #[test]
    fn test_nan_variation_is_tracked() {
        let mut max_variation = 0.5;
        track_variation(&mut max_variation, f64::NAN);
        track_variation(&mut max_variation, 2.0);
        assert!(max_variation.is_nan());
    }
}
