//! Tests for BoundingBox and Viewport operations.

use map_common::bbox::{BoundingBox, Viewport};

// ============================================================================
// BoundingBox tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-125.0, 24.0, -66.0, 50.0);
    assert_eq!(bbox.min_x, -125.0);
    assert_eq!(bbox.min_y, 24.0);
    assert_eq!(bbox.max_x, -66.0);
    assert_eq!(bbox.max_y, 50.0);
    assert_eq!(bbox.width(), 59.0);
    assert_eq!(bbox.height(), 26.0);
}

#[test]
fn test_expand_to_include() {
    let mut bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    bbox.expand_to_include(-2.0, 3.0);
    assert_eq!(bbox, BoundingBox::new(-2.0, 0.0, 1.0, 3.0));

    // Points already inside do not change the box
    bbox.expand_to_include(0.5, 0.5);
    assert_eq!(bbox, BoundingBox::new(-2.0, 0.0, 1.0, 3.0));
}

#[test]
fn test_geographic_aspect_equator_is_one() {
    let bbox = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
    assert!((bbox.geographic_aspect() - 1.0).abs() < 1e-12);
}

#[test]
fn test_geographic_aspect_conus() {
    // Mid-latitude 37 degrees
    let bbox = BoundingBox::new(-125.0, 24.0, -66.0, 50.0);
    let expected = 1.0 / 37.0_f64.to_radians().cos();
    assert!((bbox.geographic_aspect() - expected).abs() < 1e-12);
    assert!(bbox.geographic_aspect() > 1.0);
}

// ============================================================================
// Viewport tests
// ============================================================================

#[test]
fn test_viewport_tall_data_is_centered_horizontally() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
    let vp = Viewport::fit(bbox, 0.0, 0.0, 100.0, 100.0, 1.0).unwrap();

    assert_eq!(vp.scale(), 5.0);
    // 50px wide drawing centered in 100px
    assert_eq!(vp.project(0.0, 20.0), (25.0, 0.0));
    assert_eq!(vp.project(10.0, 0.0), (75.0, 100.0));
}

#[test]
fn test_viewport_respects_origin_offset() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let vp = Viewport::fit(bbox, 40.0, 60.0, 100.0, 100.0, 1.0).unwrap();
    assert_eq!(vp.project(0.0, 10.0), (40.0, 60.0));
    assert_eq!(vp.project(10.0, 0.0), (140.0, 160.0));
}

#[test]
fn test_viewport_applies_aspect() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let vp = Viewport::fit(bbox, 0.0, 0.0, 200.0, 200.0, 2.0).unwrap();

    // Data is 10 x 20 after stretching, so height limits the scale
    assert_eq!(vp.scale(), 10.0);
    let (_, top) = vp.project(0.0, 10.0);
    let (_, bottom) = vp.project(0.0, 0.0);
    assert_eq!(bottom - top, 200.0);
}

#[test]
fn test_viewport_degenerate_inputs() {
    let point = BoundingBox::new(1.0, 1.0, 1.0, 1.0);
    assert!(Viewport::fit(point, 0.0, 0.0, 100.0, 100.0, 1.0).is_none());

    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    assert!(Viewport::fit(bbox, 0.0, 0.0, 0.0, 100.0, 1.0).is_none());

    // A horizontal line still has a usable scale
    let line = BoundingBox::new(0.0, 5.0, 10.0, 5.0);
    assert!(Viewport::fit(line, 0.0, 0.0, 100.0, 100.0, 1.0).is_some());
}
