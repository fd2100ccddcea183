//! linefold-bench: CLI tool for consolidation threshold experimentation.
//!
//! Builds a deterministic synthetic scene (long ideal lines broken into
//! jittered fragments plus short noise detections), runs the staged
//! consolidation pipeline with configurable thresholds, and prints
//! per-stage timing and count diagnostics. Useful for:
//!
//! - Tuning angle/distance/endpoint gates against fragment density
//! - Measuring how the pass schedule trades recall for stability
//! - Checking point association rates over the consolidated output
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin linefold-bench -- [OPTIONS]
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::f64::consts::PI;
use std::hash::Hasher;
use std::process::ExitCode;

use clap::Parser;
use linefold_pipeline::{
    LineSegment, MergePass, PipelineConfig, Point, assign_points_to_lines, consolidate_staged,
};
use siphasher::sip::SipHasher13;

/// Consolidation threshold experimentation and diagnostics for linefold.
///
/// Synthesizes a fragmented scene, runs the consolidation pipeline with
/// the given thresholds, and prints detailed per-stage diagnostics.
#[derive(Parser)]
#[command(name = "linefold-bench", version)]
struct Cli {
    /// Number of ideal lines in the synthetic scene.
    #[arg(long, default_value_t = 12)]
    lines: usize,

    /// Fragments per ideal line.
    #[arg(long, default_value_t = 6)]
    fragments: usize,

    /// Number of short noise detections.
    #[arg(long, default_value_t = 40)]
    noise: usize,

    /// Seed for the deterministic scene jitter.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Angular gate in radians.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_ANGLE_THRESHOLD)]
    angle_threshold: f64,

    /// Perpendicular distance gate in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_DISTANCE_THRESHOLD)]
    distance_threshold: f64,

    /// Minimum length of consolidated output segments in pixels.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_FINAL_MIN_LENGTH)]
    final_min_length: f64,

    /// Also associate sampled track points with the consolidated lines.
    #[arg(long)]
    assign: bool,

    /// Dump the staged result as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

/// Deterministic hash-derived value in `[0, 1)`.
#[allow(clippy::cast_precision_loss)]
fn hash01(seed: u64, stream: u64, index: u64) -> f64 {
    let mut hasher = SipHasher13::new_with_keys(seed, 0x9e37_79b9_7f4a_7c15);
    hasher.write_u64(stream);
    hasher.write_u64(index);
    hasher.finish() as f64 / u64::MAX as f64
}

/// Deterministic hash-derived value in `[-0.5, 0.5)`.
fn jitter(seed: u64, stream: u64, index: u64) -> f64 {
    hash01(seed, stream, index) - 0.5
}

/// Synthesize fragmented detections of `cli.lines` ideal lines plus
/// noise, and track points sampled along the ideal lines.
fn synthetic_scene(cli: &Cli) -> (Vec<LineSegment>, Vec<Point>) {
    let mut segments = Vec::new();
    let mut points = Vec::new();

    #[allow(clippy::cast_precision_loss)]
    for line_idx in 0..cli.lines {
        let i = line_idx as u64;
        // Spread orientations over (-pi/2, pi/2], avoiding duplicates.
        let angle = (hash01(cli.seed, 0, i) - 0.5) * PI * 0.98;
        let (sin_a, cos_a) = angle.sin_cos();
        let cx = 200.0 + 600.0 * hash01(cli.seed, 1, i);
        let cy = 200.0 + 600.0 * hash01(cli.seed, 2, i);
        let half_span = 150.0;

        // Break the ideal line into fragments separated by small gaps,
        // with sub-pixel perpendicular jitter on every endpoint.
        let fragment_count = cli.fragments.max(1);
        let step = 2.0 * half_span / fragment_count as f64;
        for frag_idx in 0..fragment_count {
            let k = frag_idx as u64;
            let t0 = (frag_idx as f64).mul_add(step, -half_span) + 2.0;
            let t1 = ((frag_idx + 1) as f64).mul_add(step, -half_span) - 2.0;
            let n0 = jitter(cli.seed, 3, i * 1000 + k);
            let n1 = jitter(cli.seed, 4, i * 1000 + k);
            segments.push(LineSegment::from_coords(
                t0.mul_add(cos_a, cx) - n0 * sin_a,
                t0.mul_add(sin_a, cy) + n0 * cos_a,
                t1.mul_add(cos_a, cx) - n1 * sin_a,
                t1.mul_add(sin_a, cy) + n1 * cos_a,
            ));
        }

        // Track points every ~30 px along the ideal line.
        let mut t = -half_span + 10.0;
        let mut sample = 0_u64;
        while t < half_span {
            let n = 2.0 * jitter(cli.seed, 5, i * 1000 + sample);
            points.push(Point::new(
                t.mul_add(cos_a, cx) - n * sin_a,
                t.mul_add(sin_a, cy) + n * cos_a,
            ));
            t += 30.0;
            sample += 1;
        }
    }

    // Short noise detections scattered over the scene.
    for noise_idx in 0..cli.noise {
        let k = noise_idx as u64;
        let x = 1000.0 * hash01(cli.seed, 6, k);
        let y = 1000.0 * hash01(cli.seed, 7, k);
        let dx = 4.0 * jitter(cli.seed, 8, k);
        let dy = 4.0 * jitter(cli.seed, 9, k);
        segments.push(LineSegment::from_coords(x, y, x + dx, y + dy));
    }

    (segments, points)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (segments, points) = synthetic_scene(&cli);
    let config = PipelineConfig {
        passes: vec![
            MergePass::new(5.0, cli.angle_threshold, cli.distance_threshold, 15.0),
            MergePass::new(20.0, cli.angle_threshold, cli.distance_threshold, 30.0),
        ],
        final_min_length: cli.final_min_length,
    };

    println!(
        "Scene: {} segments ({} lines x {} fragments + {} noise), {} track points",
        segments.len(),
        cli.lines,
        cli.fragments,
        cli.noise,
        points.len(),
    );

    let staged = match consolidate_staged(segments, &config) {
        Ok(staged) => staged,
        Err(err) => {
            eprintln!("consolidation failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&staged) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize staged result: {err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!();
    println!("{}", staged.diagnostics.report());

    if cli.assign {
        let relation = assign_points_to_lines(&staged.lines, &points);
        let attached: usize = relation.iter().map(std::collections::BTreeSet::len).sum();
        println!();
        println!(
            "Association: {attached} attachments over {} lines ({} points)",
            staged.lines.len(),
            points.len(),
        );
        for (line_idx, point_set) in relation.iter().enumerate() {
            if !point_set.is_empty() {
                println!(
                    "  line {line_idx:>3} ({:>6.1} px): {} points",
                    staged.lines[line_idx].length(),
                    point_set.len(),
                );
            }
        }
    }

    ExitCode::SUCCESS
}
