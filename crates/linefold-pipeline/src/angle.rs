//! Orientation math and the per-pass segment table.
//!
//! Orientation angles live in `(-pi/2, pi/2]`, which wraps: a nearly
//! vertical segment sits next to the boundary on either side depending
//! on the sign of its slope, so angular distance must treat `+pi/2` and
//! `-pi/2` as the same direction. [`wrap_aware_diff`] implements that
//! metric and [`SegmentTable`] precomputes everything the clustering
//! scan needs — angles, lengths, endpoint orderings, and the
//! angle-sorted index permutation — once per pass.

use std::f64::consts::PI;

use crate::types::{LineSegment, Point};

/// Wrap-aware angular distance between two orientations in `(-pi/2, pi/2]`.
///
/// Returns `min(|a - b|, pi - |a - b|)`, so orientations near `+pi/2`
/// and `-pi/2` measure as close rather than nearly `pi` apart.
#[must_use]
pub fn wrap_aware_diff(a: f64, b: f64) -> f64 {
    let direct = (a - b).abs();
    direct.min(PI - direct)
}

/// Precomputed per-segment values for one consolidation pass.
///
/// Built once per pass and read throughout the clustering scan, instead
/// of recomputing trigonometry and endpoint orderings inside the
/// pairwise loop. Indices into the table are the positions of the
/// segments in the input slice.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    /// Orientation angle per segment (`pi/2` sentinel for verticals and
    /// degenerates).
    angles: Vec<f64>,
    /// Euclidean length per segment.
    lengths: Vec<f64>,
    /// Endpoints ordered ascending by x, per segment.
    by_x: Vec<(Point, Point)>,
    /// Endpoints ordered ascending by y, per segment.
    by_y: Vec<(Point, Point)>,
    /// Index permutation sorted ascending by angle, ties broken by
    /// original index (stable sort).
    order: Vec<usize>,
}

impl SegmentTable {
    /// Build the table for one pass over `segments`.
    #[must_use]
    pub fn build(segments: &[LineSegment]) -> Self {
        let angles: Vec<f64> = segments.iter().map(LineSegment::orientation).collect();
        let lengths: Vec<f64> = segments.iter().map(LineSegment::length).collect();
        let by_x: Vec<(Point, Point)> =
            segments.iter().map(|s| s.ordered_along(true)).collect();
        let by_y: Vec<(Point, Point)> =
            segments.iter().map(|s| s.ordered_along(false)).collect();

        let mut order: Vec<usize> = (0..segments.len()).collect();
        // Stable sort: equal angles keep detection order, which the
        // discovery-order determinism contract depends on.
        order.sort_by(|&i, &j| angles[i].total_cmp(&angles[j]));

        Self {
            angles,
            lengths,
            by_x,
            by_y,
            order,
        }
    }

    /// Number of segments in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// Returns `true` if the table holds no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Orientation angle of segment `idx`.
    #[must_use]
    pub fn angle(&self, idx: usize) -> f64 {
        self.angles[idx]
    }

    /// Euclidean length of segment `idx`.
    #[must_use]
    pub fn length(&self, idx: usize) -> f64 {
        self.lengths[idx]
    }

    /// Endpoints of segment `idx` ordered ascending along the chosen axis.
    #[must_use]
    pub fn ordered(&self, idx: usize, by_x: bool) -> (Point, Point) {
        if by_x { self.by_x[idx] } else { self.by_y[idx] }
    }

    /// The angle-sorted index permutation.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn wrap_diff_of_near_boundary_angles_is_small() {
        // 89 degrees and -89 degrees are 2 degrees apart, not 178.
        let a = 89.0_f64.to_radians();
        let b = (-89.0_f64).to_radians();
        let expected = 2.0_f64.to_radians();
        assert!((wrap_aware_diff(a, b) - expected).abs() < 1e-12);
    }

    #[test]
    fn wrap_diff_is_symmetric() {
        let a = 0.3;
        let b = -1.2;
        assert!((wrap_aware_diff(a, b) - wrap_aware_diff(b, a)).abs() < 1e-15);
    }

    #[test]
    fn wrap_diff_of_identical_angles_is_zero() {
        assert!(wrap_aware_diff(0.7, 0.7).abs() < 1e-15);
    }

    #[test]
    fn wrap_diff_of_perpendicular_angles_is_half_pi() {
        assert!((wrap_aware_diff(0.0, FRAC_PI_2) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn order_is_sorted_ascending_by_angle() {
        let segments = vec![
            LineSegment::from_coords(0.0, 0.0, 1.0, 1.0), // pi/4
            LineSegment::from_coords(0.0, 0.0, 10.0, 0.0), // 0
            LineSegment::from_coords(0.0, 0.0, 0.0, 5.0), // pi/2
            LineSegment::from_coords(0.0, 0.0, 1.0, -1.0), // -pi/4
        ];
        let table = SegmentTable::build(&segments);
        assert_eq!(table.order(), &[3, 1, 0, 2]);
    }

    #[test]
    fn order_breaks_angle_ties_by_original_index() {
        let segments = vec![
            LineSegment::from_coords(0.0, 2.0, 8.0, 2.0),
            LineSegment::from_coords(0.0, 0.0, 5.0, 0.0),
            LineSegment::from_coords(0.0, 7.0, 3.0, 7.0),
        ];
        let table = SegmentTable::build(&segments);
        assert_eq!(table.order(), &[0, 1, 2]);
    }

    #[test]
    fn table_precomputes_angles_and_lengths() {
        let segments = vec![LineSegment::from_coords(0.0, 0.0, 3.0, 4.0)];
        let table = SegmentTable::build(&segments);
        assert_eq!(table.len(), 1);
        assert!((table.length(0) - 5.0).abs() < 1e-12);
        assert!((table.angle(0) - (4.0_f64 / 3.0).atan()).abs() < 1e-12);
    }

    #[test]
    fn ordered_endpoints_follow_requested_axis() {
        let segments = vec![LineSegment::from_coords(4.0, 1.0, 0.0, 9.0)];
        let table = SegmentTable::build(&segments);

        let (lead_x, trail_x) = table.ordered(0, true);
        assert!((lead_x.x - 0.0).abs() < f64::EPSILON);
        assert!((trail_x.x - 4.0).abs() < f64::EPSILON);

        let (lead_y, trail_y) = table.ordered(0, false);
        assert!((lead_y.y - 1.0).abs() < f64::EPSILON);
        assert!((trail_y.y - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_table() {
        let table = SegmentTable::build(&[]);
        assert!(table.is_empty());
        assert!(table.order().is_empty());
    }
}
