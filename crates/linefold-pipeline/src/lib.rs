//! linefold-pipeline: line-segment consolidation (sans-IO).
//!
//! Turns the raw, fragmented output of an external 2D line-segment
//! detector into a small set of stable line features through:
//! length filtering -> angle-sorted greedy clustering -> weighted
//! merging, repeated over a configurable coarse-to-fine pass schedule.
//! An independent [`assign_points_to_lines`] operation associates
//! tracked feature points with the line they lie on.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! segment and point lists and returns structured data. Image decoding
//! and the low-level detector live with the caller; the detector is
//! represented here only by its [`DetectorOptions`] interface.
//!
//! Everything is call-scoped and deterministic: identical input order
//! and configuration always produce identical output. The only state
//! surviving a call is the read-only configuration the caller holds.

pub mod angle;
pub mod assign;
pub mod cluster;
pub mod diagnostics;
pub mod filter;
pub mod merge;
pub mod types;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::angle::SegmentTable;
use crate::diagnostics::{
    PassDiagnostics, PipelineDiagnostics, PipelineSummary, StageDiagnostics, StageMetrics,
};
pub use crate::assign::{ASSOCIATION_MARGIN, PointLineAssociation, assign_points_to_lines};
pub use crate::cluster::Cluster;
pub use crate::types::{
    DetectorOptions, LineSegment, MergePass, PipelineConfig, PipelineError, Point,
};

/// Run the consolidation pipeline.
///
/// For each configured [`MergePass`]: drop segments at or below the
/// pass's minimum length, partition the survivors into clusters of
/// likely-collinear contiguous segments, and fold each cluster into
/// one representative segment. After the last pass a final length cut
/// is applied. The final cut may legitimately leave the output empty
/// (a frame without long line features); only *mid-pipeline*
/// exhaustion is an error, since the next stage's precondition would
/// be violated.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the configuration fails
/// [`PipelineConfig::validate`]. Returns [`PipelineError::EmptyInput`]
/// if `segments` is empty. Returns [`PipelineError::NoSegments`] if a
/// pass's length filter drops every remaining segment.
pub fn consolidate(
    mut segments: Vec<LineSegment>,
    config: &PipelineConfig,
) -> Result<Vec<LineSegment>, PipelineError> {
    config.validate()?;

    for pass in &config.passes {
        filter::filter_short_segments(&mut segments, pass.min_length)?;
        if segments.is_empty() {
            return Err(PipelineError::NoSegments);
        }
        let table = SegmentTable::build(&segments);
        let clusters = cluster::build_clusters(&segments, &table, pass);
        // Cluster member lists are non-empty by construction, so the
        // fold never yields `None`; `filter_map` satisfies the type
        // system without panicking.
        segments = clusters
            .iter()
            .filter_map(|c| merge::merge_cluster(&segments, c))
            .collect();
    }

    filter::filter_short_segments(&mut segments, config.final_min_length)?;
    Ok(segments)
}

/// Output of one consolidation pass, preserved by [`consolidate_staged`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassOutput {
    /// Segments surviving the pass's length filter.
    pub filtered: Vec<LineSegment>,
    /// Clusters discovered over the filtered segments.
    pub clusters: Vec<Cluster>,
    /// Merged representative segments, one per cluster.
    pub merged: Vec<LineSegment>,
}

/// Result of running the pipeline with all intermediate stage outputs
/// preserved, plus per-stage diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedConsolidation {
    /// Per-pass intermediate outputs.
    pub passes: Vec<PassOutput>,
    /// Final consolidated segments (after the final length cut).
    pub lines: Vec<LineSegment>,
    /// Timing and count diagnostics for every stage.
    pub diagnostics: PipelineDiagnostics,
}

/// Run the consolidation pipeline, preserving every intermediate
/// result and collecting per-stage diagnostics.
///
/// Callers that only need the final segments should prefer
/// [`consolidate`], which skips the intermediate clones.
///
/// # Errors
///
/// Same contract as [`consolidate`].
pub fn consolidate_staged(
    mut segments: Vec<LineSegment>,
    config: &PipelineConfig,
) -> Result<StagedConsolidation, PipelineError> {
    config.validate()?;

    let run_start = Instant::now();
    let input_count = segments.len();
    let mut pass_outputs = Vec::with_capacity(config.passes.len());
    let mut pass_diagnostics = Vec::with_capacity(config.passes.len());

    for pass in &config.passes {
        let stage_start = Instant::now();
        let before = segments.len();
        filter::filter_short_segments(&mut segments, pass.min_length)?;
        let filter_stage = StageDiagnostics {
            duration: stage_start.elapsed(),
            metrics: StageMetrics::Filter {
                min_length: pass.min_length,
                before,
                after: segments.len(),
            },
        };
        if segments.is_empty() {
            return Err(PipelineError::NoSegments);
        }
        let filtered = segments.clone();

        let stage_start = Instant::now();
        let table = SegmentTable::build(&segments);
        let clusters = cluster::build_clusters(&segments, &table, pass);
        let cluster_stage = StageDiagnostics {
            duration: stage_start.elapsed(),
            metrics: StageMetrics::Cluster {
                angle_threshold: pass.angle_threshold,
                distance_threshold: pass.distance_threshold,
                endpoint_threshold: pass.endpoint_threshold,
                segment_count: segments.len(),
                cluster_count: clusters.len(),
                largest_cluster: clusters.iter().map(|c| c.members.len()).max().unwrap_or(0),
            },
        };

        let stage_start = Instant::now();
        let merged: Vec<LineSegment> = clusters
            .iter()
            .filter_map(|c| merge::merge_cluster(&segments, c))
            .collect();
        let multi_member_clusters = clusters.iter().filter(|c| c.members.len() > 1).count();
        let merge_stage = StageDiagnostics {
            duration: stage_start.elapsed(),
            metrics: StageMetrics::Merge {
                cluster_count: clusters.len(),
                multi_member_clusters,
                output_count: merged.len(),
            },
        };

        segments = merged.clone();
        pass_outputs.push(PassOutput {
            filtered,
            clusters,
            merged,
        });
        pass_diagnostics.push(PassDiagnostics {
            filter: filter_stage,
            cluster: cluster_stage,
            merge: merge_stage,
        });
    }

    let stage_start = Instant::now();
    let before = segments.len();
    filter::filter_short_segments(&mut segments, config.final_min_length)?;
    let final_filter = StageDiagnostics {
        duration: stage_start.elapsed(),
        metrics: StageMetrics::Filter {
            min_length: config.final_min_length,
            before,
            after: segments.len(),
        },
    };

    let diagnostics = PipelineDiagnostics {
        passes: pass_diagnostics,
        final_filter,
        total_duration: run_start.elapsed(),
        summary: PipelineSummary {
            input_count,
            output_count: segments.len(),
            pass_count: config.passes.len(),
        },
    };

    Ok(StagedConsolidation {
        passes: pass_outputs,
        lines: segments,
        diagnostics,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Four near-collinear fragments of the line y = 0 with small gaps.
    fn fragmented_horizontal() -> Vec<LineSegment> {
        vec![
            LineSegment::from_coords(0.0, 0.0, 10.0, 0.0),
            LineSegment::from_coords(12.0, 0.0, 20.0, 0.0),
            LineSegment::from_coords(22.0, 0.0, 30.0, 0.0),
            LineSegment::from_coords(32.0, 0.0, 40.0, 0.0),
        ]
    }

    fn single_pass_config() -> PipelineConfig {
        PipelineConfig {
            passes: vec![MergePass::new(5.0, 0.05, 5.0, 15.0)],
            final_min_length: 30.0,
        }
    }

    #[test]
    fn consolidate_empty_input() {
        let result = consolidate(Vec::new(), &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn consolidate_invalid_config() {
        let config = PipelineConfig {
            passes: vec![MergePass::new(5.0, -0.1, 5.0, 15.0)],
            final_min_length: 50.0,
        };
        let result = consolidate(fragmented_horizontal(), &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn fragments_consolidate_into_single_span() {
        let lines = consolidate(fragmented_horizontal(), &single_pass_config()).unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert!(line.a.distance(Point::new(0.0, 0.0)) < 0.1);
        assert!(line.b.distance(Point::new(40.0, 0.0)) < 0.1);
    }

    #[test]
    fn default_schedule_end_to_end() {
        // Fragments long enough to survive both pass filters and the
        // final 50 px cut once consolidated.
        let segments = vec![
            LineSegment::from_coords(0.0, 0.0, 20.0, 0.0),
            LineSegment::from_coords(24.0, 0.0, 40.0, 0.0),
            LineSegment::from_coords(44.0, 0.0, 60.0, 0.0),
            LineSegment::from_coords(64.0, 0.0, 80.0, 0.0),
        ];
        let lines = consolidate(segments, &PipelineConfig::default()).unwrap();
        assert_eq!(lines.len(), 1);
        assert!((lines[0].length() - 80.0).abs() < 0.5);
    }

    #[test]
    fn noise_only_input_yields_no_segments() {
        let segments = vec![
            LineSegment::from_coords(0.0, 0.0, 2.0, 0.0),
            LineSegment::from_coords(5.0, 5.0, 5.0, 8.0),
        ];
        let result = consolidate(segments, &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::NoSegments)));
    }

    #[test]
    fn final_cut_may_empty_the_output() {
        let config = PipelineConfig {
            passes: vec![MergePass::new(5.0, 0.05, 5.0, 15.0)],
            final_min_length: 100.0,
        };
        let lines = consolidate(fragmented_horizontal(), &config).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn zero_pass_config_is_filter_only() {
        let segments = vec![
            LineSegment::from_coords(0.0, 0.0, 3.0, 0.0),
            LineSegment::from_coords(0.0, 1.0, 10.0, 1.0),
            LineSegment::from_coords(0.0, 2.0, 6.0, 2.0),
            LineSegment::from_coords(0.0, 3.0, 20.0, 3.0),
        ];
        let config = PipelineConfig {
            passes: vec![],
            final_min_length: 5.0,
        };
        let lines = consolidate(segments, &config).unwrap();
        let lengths: Vec<f64> = lines.iter().map(LineSegment::length).collect();
        assert_eq!(lengths.len(), 2);
        assert!((lengths[0] - 10.0).abs() < 1e-12);
        assert!((lengths[1] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn identical_runs_produce_identical_output() {
        let first = consolidate(fragmented_horizontal(), &single_pass_config()).unwrap();
        let second = consolidate(fragmented_horizontal(), &single_pass_config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn staged_matches_unstaged_output() {
        let staged =
            consolidate_staged(fragmented_horizontal(), &single_pass_config()).unwrap();
        let unstaged = consolidate(fragmented_horizontal(), &single_pass_config()).unwrap();
        assert_eq!(staged.lines, unstaged);
    }

    #[test]
    fn staged_preserves_intermediates_and_counts() {
        let staged =
            consolidate_staged(fragmented_horizontal(), &single_pass_config()).unwrap();
        assert_eq!(staged.passes.len(), 1);

        let pass = &staged.passes[0];
        assert_eq!(pass.filtered.len(), 4);
        assert_eq!(pass.clusters.len(), 1);
        assert_eq!(pass.clusters[0].members, vec![0, 1, 2, 3]);
        assert_eq!(pass.merged.len(), 1);

        let summary = &staged.diagnostics.summary;
        assert_eq!(summary.input_count, 4);
        assert_eq!(summary.output_count, 1);
        assert_eq!(summary.pass_count, 1);
    }

    #[test]
    fn staged_serde_round_trip() {
        let staged =
            consolidate_staged(fragmented_horizontal(), &single_pass_config()).unwrap();
        let json = serde_json::to_string(&staged).unwrap();
        let deserialized: StagedConsolidation = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.lines, staged.lines);
        assert_eq!(deserialized.passes.len(), 1);
    }
}
