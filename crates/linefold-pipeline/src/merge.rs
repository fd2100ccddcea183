//! Folding a cluster of segments into one representative segment.
//!
//! The binary merge computes a length-weighted centroid and a
//! length-weighted representative angle (correcting across the `+-pi/2`
//! wrap so nearly-vertical partners never average to a horizontal),
//! projects all four endpoints onto the axis through the centroid at
//! that angle, and spans the extreme projections. The result covers the
//! full extent of both inputs along their shared dominant direction,
//! not merely their bounding box.
//!
//! The operator is not exactly commutative or associative under
//! floating rounding, so fold order is part of the contract: clusters
//! are folded left-to-right in absorption order.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::cluster::Cluster;
use crate::types::{LineSegment, Point};

/// Merge two segments into their weighted representative.
///
/// When both inputs are degenerate (total length zero) the first input
/// is returned unchanged; there is no direction to project along and
/// the weighted centroid would divide by zero.
#[must_use]
pub fn merge_two(first: &LineSegment, second: &LineSegment) -> LineSegment {
    let li = first.length();
    let lj = second.length();
    let total = li + lj;
    if total == 0.0 {
        return *first;
    }

    // Length-weighted centroid of all four endpoints.
    let xg = (li * (first.a.x + first.b.x) + lj * (second.a.x + second.b.x)) / (2.0 * total);
    let yg = (li * (first.a.y + first.b.y) + lj * (second.a.y + second.b.y)) / (2.0 * total);

    let thi = first.orientation();
    let thj = second.orientation();

    // Length-weighted representative angle. A raw difference beyond
    // pi/2 means the two orientations sit on opposite sides of the
    // wrap boundary; shift the second by a half turn before averaging.
    let theta = if (thi - thj).abs() <= FRAC_PI_2 {
        (li * thi + lj * thj) / total
    } else {
        let corrected = thj - PI * thj.signum();
        (li * thi + lj * corrected) / total
    };

    let (sin_t, cos_t) = theta.sin_cos();
    let project = |p: Point| (p.y - yg) * sin_t + (p.x - xg) * cos_t;

    let projections = [
        project(first.a),
        project(first.b),
        project(second.a),
        project(second.b),
    ];
    let mut low = projections[0];
    let mut high = projections[0];
    for &value in &projections[1..] {
        low = low.min(value);
        high = high.max(value);
    }

    LineSegment::from_coords(
        low.mul_add(cos_t, xg),
        low.mul_add(sin_t, yg),
        high.mul_add(cos_t, xg),
        high.mul_add(sin_t, yg),
    )
}

/// Fold a cluster into its representative segment.
///
/// Size-1 clusters pass their segment through unchanged. Larger
/// clusters fold left-to-right in absorption order. Returns `None`
/// only for an empty member list, which the cluster builder never
/// produces.
#[must_use]
pub fn merge_cluster(segments: &[LineSegment], cluster: &Cluster) -> Option<LineSegment> {
    cluster
        .members
        .iter()
        .map(|&idx| segments[idx])
        .reduce(|acc, seg| merge_two(&acc, &seg))
}
