//! Unit tests for config.rs

use super::*;

#[test]
fn test_defaults() {
    let config = OctreeConfig::default();
    assert_eq!(config.initial_radius, 1.0);
    assert_eq!(config.max_depth, None);
    assert_eq!(config.objects_threshold, 8);
    assert_eq!(config.overlap_pct, 0.15);
    assert!(!config.defer_insertion);
}

#[test]
fn test_builder_chain() {
    let config = OctreeConfig::default()
        .with_initial_radius(100.0)
        .with_max_depth(Some(4))
        .with_objects_threshold(2)
        .with_overlap_pct(0.1)
        .with_defer_insertion(true);

    assert_eq!(config.initial_radius, 100.0);
    assert_eq!(config.max_depth, Some(4));
    assert_eq!(config.objects_threshold, 2);
    assert_eq!(config.overlap_pct, 0.1);
    assert!(config.defer_insertion);
}

#[test]
fn test_sanitized_keeps_valid_values() {
    let config = OctreeConfig::default().with_initial_radius(50.0).with_overlap_pct(0.0);
    assert_eq!(config.sanitized(), config);
}

#[test]
fn test_sanitized_replaces_bad_radius() {
    for radius in [0.0, -3.0, f32::NAN, f32::INFINITY] {
        let config = OctreeConfig::default().with_initial_radius(radius).sanitized();
        assert_eq!(config.initial_radius, 1.0);
    }
}

#[test]
fn test_sanitized_replaces_bad_overlap() {
    for pct in [1.0, 2.5, -0.1, f32::NAN] {
        let config = OctreeConfig::default().with_overlap_pct(pct).sanitized();
        assert_eq!(config.overlap_pct, 0.15);
    }
}

#[test]
fn test_can_split_at() {
    let unbounded = OctreeConfig::default();
    assert!(unbounded.can_split_at(1000));

    let capped = OctreeConfig::default().with_max_depth(Some(2));
    assert!(capped.can_split_at(1));
    assert!(!capped.can_split_at(2));
    assert!(!capped.can_split_at(3));
}
