//! Pipeline diagnostics: timing and counts for each consolidation stage.
//!
//! Permanent instrumentation for threshold tuning: every call to
//! [`consolidate_staged`](crate::consolidate_staged) collects
//! diagnostics alongside the pipeline results. There is no global
//! timer state; all measurements live in the returned structures.
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps are
//! captured via the `web-time` crate, which uses `performance.now()`
//! on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Length filter metrics (per-pass pre-filter or the final cut).
    Filter {
        /// Minimum length threshold (pixels).
        min_length: f64,
        /// Segments before filtering.
        before: usize,
        /// Segments after filtering.
        after: usize,
    },
    /// Clustering metrics.
    Cluster {
        /// Angular gate (radians).
        angle_threshold: f64,
        /// Perpendicular distance gate (pixels).
        distance_threshold: f64,
        /// Endpoint gap gate (pixels).
        endpoint_threshold: f64,
        /// Segments scanned.
        segment_count: usize,
        /// Clusters discovered.
        cluster_count: usize,
        /// Size of the largest cluster.
        largest_cluster: usize,
    },
    /// Merge metrics.
    Merge {
        /// Clusters folded.
        cluster_count: usize,
        /// Clusters with more than one member (actual merges).
        multi_member_clusters: usize,
        /// Output segments.
        output_count: usize,
    },
}

/// Diagnostics for one filter -> cluster -> merge pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassDiagnostics {
    /// Pre-filter stage.
    pub filter: StageDiagnostics,
    /// Clustering stage.
    pub cluster: StageDiagnostics,
    /// Merge stage.
    pub merge: StageDiagnostics,
}

/// High-level summary counts for the entire run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Raw segments handed to the pipeline.
    pub input_count: usize,
    /// Consolidated segments after the final length cut.
    pub output_count: usize,
    /// Number of passes executed.
    pub pass_count: usize,
}

/// Diagnostics collected from a single consolidation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Per-pass stage breakdown.
    pub passes: Vec<PassDiagnostics>,
    /// The final length cut applied after the last pass.
    pub final_filter: StageDiagnostics,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across the run.
    pub summary: PipelineSummary,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Consolidation Diagnostics\n{}", "=".repeat(60)));
        lines.push(format!(
            "Segments: {} in -> {} out over {} pass(es)",
            self.summary.input_count, self.summary.output_count, self.summary.pass_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());
        lines.push(format!(
            "{:<20} {:>10}  {}",
            "Stage", "Duration", "Details"
        ));
        lines.push("-".repeat(72));

        for (i, pass) in self.passes.iter().enumerate() {
            let stages = [
                (format!("Pass {i} filter"), &pass.filter),
                (format!("Pass {i} cluster"), &pass.cluster),
                (format!("Pass {i} merge"), &pass.merge),
            ];
            for (name, stage) in stages {
                lines.push(format!(
                    "{name:<20} {:>8.3}ms  {}",
                    duration_ms(stage.duration),
                    format_metrics(&stage.metrics),
                ));
            }
        }
        lines.push(format!(
            "{:<20} {:>8.3}ms  {}",
            "Final filter",
            duration_ms(self.final_filter.duration),
            format_metrics(&self.final_filter.metrics),
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Filter {
            min_length,
            before,
            after,
        } => {
            format!("min_len={min_length:.1} {before}->{after} segments")
        }
        StageMetrics::Cluster {
            angle_threshold,
            distance_threshold,
            endpoint_threshold,
            segment_count,
            cluster_count,
            largest_cluster,
        } => {
            format!(
                "angle={angle_threshold:.3} dist={distance_threshold:.1} ep={endpoint_threshold:.1} \
                 {segment_count} segments -> {cluster_count} clusters (largest={largest_cluster})",
            )
        }
        StageMetrics::Merge {
            cluster_count,
            multi_member_clusters,
            output_count,
        } => {
            format!(
                "{cluster_count} clusters ({multi_member_clusters} multi) -> {output_count} segments",
            )
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> PipelineDiagnostics {
        let filter = StageDiagnostics {
            duration: Duration::from_micros(120),
            metrics: StageMetrics::Filter {
                min_length: 5.0,
                before: 40,
                after: 25,
            },
        };
        let cluster = StageDiagnostics {
            duration: Duration::from_micros(800),
            metrics: StageMetrics::Cluster {
                angle_threshold: 0.05,
                distance_threshold: 5.0,
                endpoint_threshold: 15.0,
                segment_count: 25,
                cluster_count: 7,
                largest_cluster: 6,
            },
        };
        let merge = StageDiagnostics {
            duration: Duration::from_micros(60),
            metrics: StageMetrics::Merge {
                cluster_count: 7,
                multi_member_clusters: 4,
                output_count: 7,
            },
        };
        PipelineDiagnostics {
            passes: vec![PassDiagnostics {
                filter: filter.clone(),
                cluster,
                merge,
            }],
            final_filter: StageDiagnostics {
                duration: Duration::from_micros(15),
                metrics: StageMetrics::Filter {
                    min_length: 50.0,
                    before: 7,
                    after: 3,
                },
            },
            total_duration: Duration::from_millis(1),
            summary: PipelineSummary {
                input_count: 40,
                output_count: 3,
                pass_count: 1,
            },
        }
    }

    #[test]
    fn report_mentions_every_stage() {
        let report = sample().report();
        assert!(report.contains("Pass 0 filter"));
        assert!(report.contains("Pass 0 cluster"));
        assert!(report.contains("Pass 0 merge"));
        assert!(report.contains("Final filter"));
        assert!(report.contains("40 in -> 3 out"));
    }

    #[test]
    fn serde_round_trip() {
        let diagnostics = sample();
        let json = serde_json::to_string(&diagnostics).unwrap();
        let deserialized: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.passes.len(), 1);
        assert_eq!(deserialized.summary.output_count, 3);
        assert!(
            (deserialized.total_duration.as_secs_f64()
                - diagnostics.total_duration.as_secs_f64())
            .abs()
                < 1e-12
        );
    }

    #[test]
    fn durations_serialize_as_fractional_seconds() {
        let diagnostics = sample();
        let value: serde_json::Value = serde_json::to_value(&diagnostics).unwrap();
        let total = value["total_duration"].as_f64().unwrap();
        assert!((total - 0.001).abs() < 1e-9);
    }
}
