//! Length filtering: drop segments at or below a minimum length.
//!
//! Short detections are dominated by noise and destabilize the
//! downstream clustering, so every consolidation pass starts by cutting
//! them. The filter is stable (surviving segments keep their relative
//! order) and in place.

use crate::types::{LineSegment, PipelineError};

/// Remove segments whose Euclidean length is `<= min_length`, in place.
///
/// Lengths are compared squared, so no square roots are taken. The
/// comparison is strict: a segment of exactly the threshold length is
/// dropped, which also guarantees that zero-length (degenerate)
/// segments never survive, for any non-negative threshold.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `segments` is empty on
/// entry. An empty list is a caller bug, not a condition to silently
/// absorb.
pub fn filter_short_segments(
    segments: &mut Vec<LineSegment>,
    min_length: f64,
) -> Result<(), PipelineError> {
    if segments.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let threshold_squared = min_length * min_length;
    segments.retain(|segment| segment.length_squared() > threshold_squared);
    Ok(())
}
