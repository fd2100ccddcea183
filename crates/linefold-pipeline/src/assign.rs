//! Point-to-line association.
//!
//! Associates tracked 2D feature points with the finalized line
//! segments they lie on, for joint point-line data association in
//! tracking and optimization. Candidate pairs are pre-filtered through
//! an R*-tree of margin-expanded segment bounding boxes; survivors go
//! through the exact perpendicular-distance and span tests.
//!
//! The association is purely derived state: recomputed on demand,
//! owned by nobody.

use std::collections::BTreeSet;

use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};

use crate::types::{LineSegment, Point};

/// Association margin in pixels: bounding boxes are expanded by this
/// much on every side, and it is also the maximum perpendicular
/// distance and the endpoint acceptance radius.
pub const ASSOCIATION_MARGIN: f64 = 3.0;

/// Mapping from line index to the set of point indices on that line.
///
/// A point may belong to zero, one, or several lines.
pub type PointLineAssociation = Vec<BTreeSet<usize>>;

/// Implicit-form coefficients of a segment's infinite extension:
/// `a*x + b*y + c`, with the segment length as normalizer.
struct LineCoefficients {
    a: f64,
    b: f64,
    c: f64,
    length_squared: f64,
}

impl LineCoefficients {
    /// `None` for degenerate segments, whose infinite extension is
    /// undefined and must never reach the distance math.
    fn of(segment: &LineSegment) -> Option<Self> {
        let length_squared = segment.length_squared();
        if length_squared == 0.0 {
            return None;
        }
        Some(Self {
            a: segment.b.y - segment.a.y,
            b: segment.a.x - segment.b.x,
            c: segment.b.x.mul_add(segment.a.y, -(segment.a.x * segment.b.y)),
            length_squared,
        })
    }

    /// Perpendicular distance from `p` to the infinite extension.
    fn distance_to(&self, p: Point) -> f64 {
        self.a.mul_add(p.x, self.b.mul_add(p.y, self.c)).abs() / self.length_squared.sqrt()
    }
}

/// A margin-expanded segment bounding box tagged with its line index.
type IndexedBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

fn expanded_box(segment: &LineSegment, index: usize) -> IndexedBox {
    let lower = [
        segment.a.x.min(segment.b.x) - ASSOCIATION_MARGIN,
        segment.a.y.min(segment.b.y) - ASSOCIATION_MARGIN,
    ];
    let upper = [
        segment.a.x.max(segment.b.x) + ASSOCIATION_MARGIN,
        segment.a.y.max(segment.b.y) + ASSOCIATION_MARGIN,
    ];
    GeomWithData::new(Rectangle::from_corners(lower, upper), index)
}

/// Associate every point with every line it lies on.
///
/// For each candidate (line, point) pair surviving the bounding-box
/// pre-filter, the point is accepted when its perpendicular distance to
/// the line's infinite extension is at most [`ASSOCIATION_MARGIN`] and
/// either it sits within the margin of an endpoint (even beyond the
/// segment's span), or the law-of-cosines test confirms its
/// perpendicular foot falls strictly within the span: both angles at
/// the endpoints must be acute, i.e. `side1 < line_side + side2` and
/// `side2 < line_side + side1` for the squared point-to-endpoint
/// distances and the squared segment length.
///
/// Degenerate (zero-length) lines accept no points. The returned sets
/// hold point indices in ascending order.
#[must_use]
pub fn assign_points_to_lines(lines: &[LineSegment], points: &[Point]) -> PointLineAssociation {
    let mut relation: PointLineAssociation = vec![BTreeSet::new(); lines.len()];

    let coefficients: Vec<Option<LineCoefficients>> =
        lines.iter().map(LineCoefficients::of).collect();

    let boxes: Vec<IndexedBox> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| coefficients[*i].is_some())
        .map(|(i, segment)| expanded_box(segment, i))
        .collect();
    let tree = RTree::bulk_load(boxes);

    let margin_squared = ASSOCIATION_MARGIN * ASSOCIATION_MARGIN;
    for (point_idx, &p) in points.iter().enumerate() {
        for candidate in tree.locate_all_at_point(&[p.x, p.y]) {
            let line_idx = candidate.data;
            let Some(coeff) = &coefficients[line_idx] else {
                continue;
            };
            if coeff.distance_to(p) > ASSOCIATION_MARGIN {
                continue;
            }

            let line = &lines[line_idx];
            let side1 = line.a.distance_squared(p);
            let side2 = line.b.distance_squared(p);
            let line_side = coeff.length_squared;
            let near_endpoint = side1 <= margin_squared || side2 <= margin_squared;
            let foot_within_span = side1 < line_side + side2 && side2 < line_side + side1;
            if near_endpoint || foot_within_span {
                relation[line_idx].insert(point_idx);
            }
        }
    }

    relation
}
