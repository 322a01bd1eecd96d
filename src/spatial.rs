//! Spatial queries over the segments of a vascular tree.
//!
//! [SegmentIndex] keeps an R*-tree over all vessel segments of a tree and
//! answers the queries the growth engine needs:
//! - nearest on-tree point to a query point (terminal acceptance),
//! - segments intersecting a bounding box (candidate parents),
//! - [segment_intersection] for crossing tests between prospective and
//!   existing segments.
//!
//! The index stores [VesselIndex] values only. The owning tree keeps it in
//! sync on every split and rebuilds it on prune, merge and clone.

use crate::model::point::{BoundingBox, Point};
use crate::model::vessel::{Vessel, VesselIndex};
use rstar::primitives::{GeomWithData, Line};
use rstar::{AABB, RTree};
use std::fmt;

type IndexedSegment = GeomWithData<Line<[f64; 3]>, VesselIndex>;

/// Determinants below this magnitude are treated as parallel lines.
const PARALLEL_TOLERANCE: f64 = 1e-12;

/// Closest-approach parameters within this distance of 0 or 1 count as endpoints.
const ENDPOINT_TOLERANCE: f64 = 1e-9;

fn indexed_segment(index: VesselIndex, proximal: Point, distal: Point) -> IndexedSegment {
    GeomWithData::new(Line::new(proximal.to_array(), distal.to_array()), index)
}

// =#========================================================================#=
// SEGMENT INDEX
// =#========================================================================#=
/// R*-tree over the segments of the vessels of one tree.
#[derive(Clone, Default)]
pub struct SegmentIndex {
    rtree: RTree<IndexedSegment>,
}

impl SegmentIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        SegmentIndex { rtree: RTree::new() }
    }

    /// Builds an index over all given vessels at once.
    pub fn bulk_load(vessels: &[Vessel]) -> Self {
        let segments = vessels
            .iter()
            .map(|vessel| indexed_segment(vessel.index(), vessel.proximal(), vessel.distal()))
            .collect();
        SegmentIndex { rtree: RTree::bulk_load(segments) }
    }

    /// Adds the segment of a vessel.
    pub fn insert(&mut self, index: VesselIndex, proximal: Point, distal: Point) {
        self.rtree.insert(indexed_segment(index, proximal, distal));
    }

    /// Removes the segment of a vessel, given the endpoints it was indexed with.
    ///
    /// # Returns
    /// `true` if the segment was present.
    pub fn remove(&mut self, index: VesselIndex, proximal: Point, distal: Point) -> bool {
        self.rtree.remove(&indexed_segment(index, proximal, distal)).is_some()
    }

    /// Returns the number of indexed segments.
    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    /// Returns whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the on-tree point closest to `point`.
    ///
    /// # Returns
    /// The closest point, its distance to `point`, and the vessel it lies on;
    /// `None` if the index is empty.
    pub fn nearest_point(&self, point: Point) -> Option<(Point, f64, VesselIndex)> {
        let query = point.to_array();
        let segment = self.rtree.nearest_neighbor(&query)?;
        let closest = Point::from_array(segment.geom().nearest_point(&query));
        Some((closest, closest.distance(point), segment.data))
    }

    /// Returns the vessels whose segment bounding boxes intersect `bounding_box`,
    /// in ascending index order.
    pub fn segments_within_box(&self, bounding_box: &BoundingBox) -> Vec<VesselIndex> {
        let envelope = AABB::from_corners(bounding_box.min.to_array(), bounding_box.max.to_array());
        let mut found: Vec<VesselIndex> = self
            .rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|segment| segment.data)
            .collect();
        found.sort_unstable();
        found
    }
}

impl fmt::Debug for SegmentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentIndex").field("segments", &self.len()).finish()
    }
}

// =#========================================================================#=
// SEGMENT INTERSECTION
// =#========================================================================#=
/// Result of [segment_intersection].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentIntersection {
    /// Whether the closest approach lies strictly inside both segments.
    pub intersects: bool,
    /// Parameter of the closest approach along segment A (`0` at `a0`, `1` at `a1`).
    pub param_a: f64,
    /// Parameter of the closest approach along segment B.
    pub param_b: f64,
}

/// Tests two segments for crossing.
///
/// Solves for the parameters of closest approach of the supporting lines,
/// i.e. the lines are intersected after projection onto the plane normal to
/// their common perpendicular. For coplanar segments this is the exact 2-D
/// crossing test. Only interior parameters (`0 < u < 1`, `0 < v < 1`, up to
/// rounding) count, so segments sharing an endpoint never intersect.
/// Parallel segments never intersect.
pub fn segment_intersection(a0: Point, a1: Point, b0: Point, b1: Point) -> SegmentIntersection {
    let a = a1 - a0;
    let b = b1 - b0;
    let offset = b0 - a0;

    let aa = a.length_squared();
    let ab = a.dot(b);
    let bb = b.length_squared();
    let determinant = aa * bb - ab * ab;

    if determinant.abs() <= PARALLEL_TOLERANCE * aa.max(bb).max(1.0) {
        return SegmentIntersection { intersects: false, param_a: f64::NAN, param_b: f64::NAN };
    }

    let c_a = a.dot(offset);
    let c_b = -b.dot(offset);
    let param_a = (c_a * bb + ab * c_b) / determinant;
    let param_b = (aa * c_b + ab * c_a) / determinant;

    let interior = |t: f64| t > ENDPOINT_TOLERANCE && t < 1.0 - ENDPOINT_TOLERANCE;
    SegmentIntersection { intersects: interior(param_a) && interior(param_b), param_a, param_b }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_crossing_segments() {
        let result = segment_intersection(
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(1.0, -1.0, 0.0),
            Point::new(1.0, 3.0, 0.0),
        );
        assert!(result.intersects);
        assert!((result.param_a - 0.5).abs() < EPSILON);
        assert!((result.param_b - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_shared_endpoint_is_not_a_crossing() {
        let result = segment_intersection(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
        );
        assert!(!result.intersects);
    }

    #[test]
    fn test_parallel_segments() {
        let result = segment_intersection(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
        );
        assert!(!result.intersects);
    }

    #[test]
    fn test_disjoint_segments_on_crossing_lines() {
        let result = segment_intersection(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(3.0, -1.0, 0.0),
            Point::new(3.0, 1.0, 0.0),
        );
        assert!(!result.intersects);
        assert!((result.param_a - 3.0).abs() < EPSILON);
    }
}
