//! Perfusion domain the tree grows into.

use crate::model::point::{BoundingBox, Point};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_PERFUSION_AREA_FACTOR: f64 = 0.5;
const DEFAULT_CLOSE_NEIGHBORHOOD_FACTOR: f64 = 4.0;

// =#========================================================================#=
// DOMAIN (Trait)
// =#========================================================================#=
/// Perfusion volume: source of terminal points and membership tests.
///
/// The distance limit and neighborhood shrink as the tree fills the domain:
/// with `n` terminals, `d_lim = characteristic_length * cbrt(factor / n)`.
pub trait Domain {
    /// Draws the next candidate terminal point inside the domain.
    fn random_point(&mut self) -> Point;

    /// Returns whether `point` lies inside the domain.
    fn contains(&self, point: Point) -> bool;

    /// Length scale of the domain.
    fn characteristic_length(&self) -> f64;

    /// Share of the domain each terminal perfuses, used for neighborhoods.
    fn perfusion_area_factor(&self) -> f64;

    /// Neighborhood size in multiples of the distance limit.
    fn close_neighborhood_factor(&self) -> f64;

    /// Returns whether the segment `from -> to` lies inside the domain.
    ///
    /// The default only checks the endpoints, exact for convex domains.
    fn is_segment_inside(&self, from: Point, to: Point) -> bool {
        self.contains(from) && self.contains(to)
    }

    /// Minimum distance between a new terminal and the tree.
    fn distance_limit(&self, num_terminals: usize, factor: f64) -> f64 {
        self.characteristic_length() * (factor / num_terminals.max(1) as f64).cbrt()
    }

    /// Box around `point` in which candidate parent vessels are searched.
    fn local_neighborhood(&self, point: Point, num_terminals: usize) -> BoundingBox {
        let radius = self.close_neighborhood_factor() * self.distance_limit(num_terminals, self.perfusion_area_factor());
        BoundingBox::around(point, radius)
    }
}

// =#========================================================================#=
// BOX DOMAIN
// =#========================================================================#=
/// Axis-aligned box with a seeded uniform point source.
///
/// A box with zero extent along one axis is a planar domain.
#[derive(Debug, Clone)]
pub struct BoxDomain {
    bounds: BoundingBox,
    rng: StdRng,
    perfusion_area_factor: f64,
    close_neighborhood_factor: f64,
}

impl BoxDomain {
    /// Creates the box spanned by two corners, drawing points from `seed`.
    pub fn new(corner: Point, opposite: Point, seed: u64) -> Self {
        BoxDomain {
            bounds: BoundingBox::from_corners(corner, opposite),
            rng: StdRng::seed_from_u64(seed),
            perfusion_area_factor: DEFAULT_PERFUSION_AREA_FACTOR,
            close_neighborhood_factor: DEFAULT_CLOSE_NEIGHBORHOOD_FACTOR,
        }
    }

    pub fn with_perfusion_area_factor(mut self, factor: f64) -> Self {
        self.perfusion_area_factor = factor;
        self
    }

    pub fn with_close_neighborhood_factor(mut self, factor: f64) -> Self {
        self.close_neighborhood_factor = factor;
        self
    }

    /// Returns the bounds of the box.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }
}

impl Domain for BoxDomain {
    fn random_point(&mut self) -> Point {
        let extent = self.bounds.max - self.bounds.min;
        Point::new(
            self.bounds.min.x + extent.x * self.rng.r#gen::<f64>(),
            self.bounds.min.y + extent.y * self.rng.r#gen::<f64>(),
            self.bounds.min.z + extent.z * self.rng.r#gen::<f64>(),
        )
    }

    fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }

    /// Half of the widest extent.
    fn characteristic_length(&self) -> f64 {
        self.bounds.max_half_extent()
    }

    fn perfusion_area_factor(&self) -> f64 {
        self.perfusion_area_factor
    }

    fn close_neighborhood_factor(&self) -> f64 {
        self.close_neighborhood_factor
    }
}
