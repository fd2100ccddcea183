//! Shared types for the linefold consolidation pipeline.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A 2D line segment defined by two endpoints.
///
/// Endpoints are stored in detection order, **not** canonically.
/// Algorithms that need a canonical endpoint order sort per use along
/// whichever axis dominates the segment's orientation via
/// [`ordered_along`](Self::ordered_along).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    /// First endpoint as reported by the detector.
    pub a: Point,
    /// Second endpoint as reported by the detector.
    pub b: Point,
}

impl LineSegment {
    /// Create a segment from two endpoints.
    #[must_use]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Create a segment from raw coordinates `(x1, y1, x2, y2)`.
    #[must_use]
    pub const fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    /// Endpoint delta along x.
    #[must_use]
    pub fn dx(&self) -> f64 {
        self.b.x - self.a.x
    }

    /// Endpoint delta along y.
    #[must_use]
    pub fn dy(&self) -> f64 {
        self.b.y - self.a.y
    }

    /// Squared Euclidean length.
    #[must_use]
    pub fn length_squared(&self) -> f64 {
        self.a.distance_squared(self.b)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Orientation angle in `(-pi/2, pi/2]`, computed as `atan(dy/dx)`.
    ///
    /// Vertical segments map to `pi/2`. Degenerate segments (identical
    /// endpoints, where `dy/dx` would be 0/0) also map to the `pi/2`
    /// sentinel rather than producing NaN.
    #[must_use]
    pub fn orientation(&self) -> f64 {
        let dx = self.dx();
        if dx == 0.0 {
            FRAC_PI_2
        } else {
            (self.dy() / dx).atan()
        }
    }

    /// Endpoints ordered ascending along the given axis.
    ///
    /// Returns `(leading, trailing)` sorted by x when `by_x` is true,
    /// by y otherwise. The axis is chosen by the caller from the
    /// *anchor* segment's orientation, so both members of a candidate
    /// pair are ordered consistently.
    #[must_use]
    pub const fn ordered_along(&self, by_x: bool) -> (Point, Point) {
        let swap = if by_x {
            self.b.x < self.a.x
        } else {
            self.b.y < self.a.y
        };
        if swap { (self.b, self.a) } else { (self.a, self.b) }
    }
}

/// Configuration of the external line-segment detector.
///
/// The detector itself is an outside collaborator that turns a pixel
/// image into an ordered sequence of candidate segments; this crate
/// only defines the option set callers hand to it. Defaults follow the
/// conventional fast-line-detector parameterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorOptions {
    /// Segments shorter than this (pixels) are discarded by the detector.
    pub length_threshold: u32,
    /// Maximum point-to-line distance (pixels) during detector line fitting.
    pub distance_threshold: f32,
    /// Canny low hysteresis threshold.
    pub canny_low: f32,
    /// Canny high hysteresis threshold.
    pub canny_high: f32,
    /// Canny Sobel aperture size (must be odd).
    pub canny_aperture_size: u32,
    /// Whether the consumer should run the consolidation passes on the
    /// detector output.
    pub do_merge: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            length_threshold: 10,
            distance_threshold: 1.414_213_5,
            canny_low: 50.0,
            canny_high: 50.0,
            canny_aperture_size: 3,
            do_merge: false,
        }
    }
}

/// Parameters for a single filter -> cluster -> merge pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergePass {
    /// Segments with length `<= min_length` are dropped before clustering.
    pub min_length: f64,
    /// Maximum wrap-aware angular difference (radians) for two segments
    /// to be considered collinear candidates.
    pub angle_threshold: f64,
    /// Maximum perpendicular endpoint-to-infinite-line distance (pixels).
    pub distance_threshold: f64,
    /// Maximum endpoint gap (pixels, compared squared) for two
    /// non-overlapping segments to still count as contiguous.
    pub endpoint_threshold: f64,
}

impl MergePass {
    /// Create a pass from its four thresholds.
    #[must_use]
    pub const fn new(
        min_length: f64,
        angle_threshold: f64,
        distance_threshold: f64,
        endpoint_threshold: f64,
    ) -> Self {
        Self {
            min_length,
            angle_threshold,
            distance_threshold,
            endpoint_threshold,
        }
    }
}

/// Configuration for the consolidation pipeline.
///
/// The pipeline runs each [`MergePass`] in order (coarse-to-fine:
/// progressively looser distance/endpoint thresholds, stricter minimum
/// lengths), then applies a final length filter to the merged output.
///
/// # Threshold invariants
///
/// All thresholds must be finite and non-negative, and every pass's
/// `angle_threshold` must stay below `pi/2` (an angle gate of a quarter
/// turn or more would defeat the wrap-aware difference). These are
/// enforced by [`validate`](Self::validate), which the pipeline entry
/// points call before touching any segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Consolidation passes, applied in order.
    pub passes: Vec<MergePass>,
    /// Minimum length (pixels) of segments in the final output.
    pub final_min_length: f64,
}

impl PipelineConfig {
    /// Default angular compatibility threshold (radians).
    pub const DEFAULT_ANGLE_THRESHOLD: f64 = 0.05;
    /// Default perpendicular distance threshold (pixels).
    pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 5.0;
    /// Default minimum length of consolidated output segments (pixels).
    pub const DEFAULT_FINAL_MIN_LENGTH: f64 = 50.0;

    /// Check the threshold invariants documented on this type.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the offending
    /// field when any threshold is non-finite, negative, or (for angle
    /// thresholds) at or beyond `pi/2`.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (i, pass) in self.passes.iter().enumerate() {
            let fields = [
                ("min_length", pass.min_length),
                ("angle_threshold", pass.angle_threshold),
                ("distance_threshold", pass.distance_threshold),
                ("endpoint_threshold", pass.endpoint_threshold),
            ];
            for (name, value) in fields {
                if !value.is_finite() || value < 0.0 {
                    return Err(PipelineError::InvalidConfig(format!(
                        "pass {i}: {name} must be finite and non-negative, got {value}"
                    )));
                }
            }
            if pass.angle_threshold >= FRAC_PI_2 {
                return Err(PipelineError::InvalidConfig(format!(
                    "pass {i}: angle_threshold must be below pi/2, got {}",
                    pass.angle_threshold
                )));
            }
        }
        if !self.final_min_length.is_finite() || self.final_min_length < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "final_min_length must be finite and non-negative, got {}",
                self.final_min_length
            )));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    /// The production schedule: a tight first pass that consolidates
    /// fragments while dropping short noise, then a looser second pass
    /// over the survivors, then a strict final length cut.
    fn default() -> Self {
        Self {
            passes: vec![
                MergePass::new(
                    5.0,
                    Self::DEFAULT_ANGLE_THRESHOLD,
                    Self::DEFAULT_DISTANCE_THRESHOLD,
                    15.0,
                ),
                MergePass::new(
                    20.0,
                    Self::DEFAULT_ANGLE_THRESHOLD,
                    Self::DEFAULT_DISTANCE_THRESHOLD,
                    30.0,
                ),
            ],
            final_min_length: Self::DEFAULT_FINAL_MIN_LENGTH,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// The input segment list was empty.
    #[error("input segment list is empty")]
    EmptyInput,

    /// A length filter dropped every remaining segment mid-pipeline.
    #[error("no segments remain after length filtering")]
    NoSegments,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
