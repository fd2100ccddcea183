//! Greedy clustering of angle-sorted segments into likely-collinear,
//! likely-contiguous groups.
//!
//! The scan walks the angle-sorted order once. Each unclustered segment
//! opens a new cluster, then tries to absorb every later segment that
//! passes three gates: a wrap-aware angular difference, a four-way
//! perpendicular-distance check against both infinite extensions, and
//! an endpoint contiguity check along the anchor's dominant axis.
//!
//! Membership is deliberately *not* the transitive closure of pairwise
//! compatibility: a segment joins the cluster of the first compatible,
//! already-clustered segment it is compared against, and once clustered
//! it is never reassigned. Two members of one cluster may be pairwise
//! incompatible if a third segment bridged them. Clusters therefore
//! always partition the processed indices, and the output is a pure
//! deterministic function of input order and configuration.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use serde::{Deserialize, Serialize};

use crate::angle::{SegmentTable, wrap_aware_diff};
use crate::types::{LineSegment, MergePass, Point};

/// A group of segment indices considered the same underlying line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster id, equal to its position in discovery order.
    pub id: usize,
    /// Member segment indices (into the pass's segment slice), in
    /// absorption order. The first member is the cluster's anchor.
    pub members: Vec<usize>,
}

/// Perpendicular distance from `p` to the infinite extension of `line`.
///
/// When the segment is degenerate (zero length), returns the distance
/// to its endpoint instead of dividing by zero.
#[must_use]
pub fn point_to_infinite_line(line: &LineSegment, p: Point) -> f64 {
    let length = line.length();
    if length == 0.0 {
        return line.a.distance(p);
    }
    let numerator = (line.b.y - line.a.y).mul_add(
        p.x,
        (line.a.x - line.b.x).mul_add(p.y, line.b.x.mul_add(line.a.y, -(line.a.x * line.b.y))),
    );
    numerator.abs() / length
}

/// Whether `a` comes after `b` along the chosen axis.
const fn trails(a: Point, b: Point, by_x: bool) -> bool {
    if by_x { a.x > b.x } else { a.y > b.y }
}

/// Partition `segments` into clusters of mutually mergeable segments.
///
/// `table` must have been built from the same slice. Returns clusters
/// in discovery order, each holding at least one segment index.
#[must_use]
pub fn build_clusters(
    segments: &[LineSegment],
    table: &SegmentTable,
    pass: &MergePass,
) -> Vec<Cluster> {
    let order = table.order();
    let n = order.len();
    let endpoint_threshold_squared = pass.endpoint_threshold * pass.endpoint_threshold;

    let mut member_lists: Vec<Vec<usize>> = Vec::new();
    // Cluster code per *sorted position* (not per original index): the
    // scan below only ever addresses segments through the permutation.
    let mut codes: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        let idx1 = order[i];
        let angle1 = table.angle(idx1);
        let by_x = angle1.abs() < FRAC_PI_4;
        let (lead1, trail1) = table.ordered(idx1, by_x);

        let code = match codes[i] {
            Some(existing) => existing,
            None => {
                let fresh = member_lists.len();
                member_lists.push(vec![idx1]);
                codes[i] = Some(fresh);
                fresh
            }
        };

        for j in (i + 1)..n {
            let idx2 = order[j];
            let d_angle = wrap_aware_diff(angle1, table.angle(idx2));
            if d_angle > pass.angle_threshold {
                // Sorted order means later segments only diverge further,
                // so the scan can stop -- except when the anchor sits
                // within the gate of the pi/2 boundary, where a partner's
                // angle may have wrapped to the far end of the ordering.
                if angle1.abs() < FRAC_PI_2 - pass.angle_threshold {
                    break;
                }
                continue;
            }

            // First absorber wins: a clustered segment is never
            // re-tested, keeping the clusters a partition.
            if codes[j].is_some() {
                continue;
            }

            let seg1 = &segments[idx1];
            let seg2 = &segments[idx2];
            if point_to_infinite_line(seg1, seg2.a) > pass.distance_threshold
                || point_to_infinite_line(seg1, seg2.b) > pass.distance_threshold
                || point_to_infinite_line(seg2, seg1.a) > pass.distance_threshold
                || point_to_infinite_line(seg2, seg1.b) > pass.distance_threshold
            {
                continue;
            }

            // Contiguity along the anchor's axis: whichever segment
            // trails, measure from the other's trailing endpoint to its
            // leading endpoint. Overlapping spans always pass; otherwise
            // the squared endpoint gap must stay under the threshold.
            let (lead2, trail2) = table.ordered(idx2, by_x);
            let (tail, head) = if trails(trail1, trail2, by_x) {
                (trail2, lead1)
            } else {
                (trail1, lead2)
            };
            let contiguous = !trails(head, tail, by_x)
                || tail.distance_squared(head) < endpoint_threshold_squared;

            if contiguous {
                member_lists[code].push(idx2);
                codes[j] = Some(code);
            }
        }
    }

    member_lists
        .into_iter()
        .enumerate()
        .map(|(id, members)| Cluster { id, members })
        .collect()
}
