//! Point module for 3-D coordinates of vessel endpoints.
//!
//! Points and direction vectors are [glam::DVec3]; this module adds the bit
//! key used when matching recorded coordinates and the [BoundingBox] used to
//! query the spatial index.

use glam::DVec3;

/// A point (or vector) in 3-D space.
///
/// Used both for vessel endpoints and for direction vectors between them.
/// Equality is exact floating-point equality; see [to_bits] for the
/// structural key used when matching recorded coordinates.
pub type Point = DVec3;

/// Returns the raw bit patterns of the three coordinates of `point`.
pub fn to_bits(point: Point) -> [u64; 3] {
    point.to_array().map(f64::to_bits)
}

// =#========================================================================#=
// BOUNDING BOX
// =#========================================================================#=
/// Axis-aligned box, used to query the spatial index for nearby vessels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Creates a box from two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        BoundingBox { min: a.min(b), max: a.max(b) }
    }

    /// Creates the cube `center ± half_width` along every axis.
    pub fn around(center: Point, half_width: f64) -> Self {
        let offset = Point::splat(half_width);
        BoundingBox::from_corners(center - offset, center + offset)
    }

    /// Returns whether `point` lies inside the box (boundary included).
    pub fn contains(&self, point: Point) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns the half extent along the widest axis.
    pub fn max_half_extent(&self) -> f64 {
        (self.max - self.min).max_element() / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_distinguish_signed_zero() {
        assert_eq!(Point::new(0.0, 1.0, 2.0), Point::new(-0.0, 1.0, 2.0));
        assert_ne!(to_bits(Point::new(0.0, 1.0, 2.0)), to_bits(Point::new(-0.0, 1.0, 2.0)));
    }

    #[test]
    fn test_bounding_box() {
        let bounds = BoundingBox::from_corners(Point::new(1.0, -1.0, 2.0), Point::new(-1.0, 3.0, 0.0));
        assert_eq!(bounds.min, Point::new(-1.0, -1.0, 0.0));
        assert_eq!(bounds.max, Point::new(1.0, 3.0, 2.0));
        assert!(bounds.contains(Point::new(1.0, 3.0, 2.0)));
        assert!(!bounds.contains(Point::new(1.0, 3.0, 2.5)));
        assert_eq!(bounds.max_half_extent(), 2.0);
        assert!(BoundingBox::around(Point::ZERO, 0.5).contains(Point::splat(-0.5)));
    }
}
