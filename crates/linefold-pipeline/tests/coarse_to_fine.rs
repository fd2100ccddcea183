//! Integration test: a synthetic fragmented scene through the full
//! coarse-to-fine pipeline, then point association over the result.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::f64::consts::FRAC_PI_4;

use linefold_pipeline::{
    LineSegment, PipelineConfig, Point, assign_points_to_lines, consolidate,
};

/// Three ideal lines broken into fragments, plus short noise specks.
fn fragmented_scene() -> Vec<LineSegment> {
    vec![
        // Horizontal line y = 250, x in [0, 200].
        LineSegment::from_coords(0.0, 250.0, 35.0, 250.0),
        LineSegment::from_coords(38.0, 250.0, 80.0, 250.0),
        LineSegment::from_coords(83.0, 250.0, 140.0, 250.0),
        LineSegment::from_coords(143.0, 250.0, 200.0, 250.0),
        // Vertical line x = 300, y in [0, 180].
        LineSegment::from_coords(300.0, 0.0, 300.0, 30.0),
        LineSegment::from_coords(300.0, 33.0, 300.0, 75.0),
        LineSegment::from_coords(300.0, 78.0, 300.0, 130.0),
        LineSegment::from_coords(300.0, 133.0, 300.0, 180.0),
        // Diagonal line y = x, from (0, 0) to (150, 150).
        LineSegment::from_coords(0.0, 0.0, 40.0, 40.0),
        LineSegment::from_coords(44.0, 44.0, 90.0, 90.0),
        LineSegment::from_coords(94.0, 94.0, 150.0, 150.0),
        // Noise: short detections that the first pass must drop.
        LineSegment::from_coords(400.0, 10.0, 403.0, 10.0),
        LineSegment::from_coords(420.0, 50.0, 420.0, 54.0),
        LineSegment::from_coords(50.0, 300.0, 53.0, 302.0),
    ]
}

#[test]
fn scene_consolidates_to_three_lines_and_points_attach() {
    let lines = consolidate(fragmented_scene(), &PipelineConfig::default())
        .expect("pipeline should succeed on the synthetic scene");
    eprintln!("Consolidated {} lines: {lines:?}", lines.len());
    assert_eq!(lines.len(), 3);

    // Identify the consolidated lines by orientation.
    let horizontal = lines
        .iter()
        .position(|l| l.orientation().abs() < 0.1)
        .unwrap();
    let diagonal = lines
        .iter()
        .position(|l| (l.orientation() - FRAC_PI_4).abs() < 0.1)
        .unwrap();
    let vertical = lines
        .iter()
        .position(|l| l.orientation().abs() > 1.5)
        .unwrap();

    // Each consolidated line spans the full extent of its fragments.
    assert!((lines[horizontal].length() - 200.0).abs() < 1.0);
    assert!((lines[vertical].length() - 180.0).abs() < 1.0);
    assert!((lines[diagonal].length() - 150.0 * std::f64::consts::SQRT_2).abs() < 1.5);

    // Tracked points attach to the line they lie on and nothing else.
    let points = vec![
        Point::new(100.0, 250.0), // on the horizontal line
        Point::new(300.0, 90.0),  // on the vertical line
        Point::new(75.0, 75.0),   // on the diagonal line
        Point::new(500.0, 500.0), // far from everything
    ];
    let relation = assign_points_to_lines(&lines, &points);

    assert!(relation[horizontal].contains(&0));
    assert!(relation[vertical].contains(&1));
    assert!(relation[diagonal].contains(&2));
    for sets in &relation {
        assert!(!sets.contains(&3), "far point must attach nowhere");
    }
    assert_eq!(relation[horizontal].len(), 1);
    assert_eq!(relation[vertical].len(), 1);
    assert_eq!(relation[diagonal].len(), 1);
}

#[test]
fn consolidation_is_deterministic_across_runs() {
    let config = PipelineConfig::default();
    let first = consolidate(fragmented_scene(), &config).unwrap();
    let second = consolidate(fragmented_scene(), &config).unwrap();
    assert_eq!(first, second);
}
