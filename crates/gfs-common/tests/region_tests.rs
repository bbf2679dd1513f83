//! Tests for Region construction and containment.

use gfs_common::region::Region;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_region_new_keeps_ordered_bounds() {
    let region = Region::new(-9.0, -6.5, 110.8, 114.8);
    assert_eq!(region.lat_min, -9.0);
    assert_eq!(region.lat_max, -6.5);
    assert_eq!(region.lon_min, 110.8);
    assert_eq!(region.lon_max, 114.8);
}

#[test]
fn test_region_new_swaps_descending_bounds() {
    let region = Region::new(-6.5, -9.0, 114.8, 110.8);
    assert_eq!(region.lat_min, -9.0);
    assert_eq!(region.lat_max, -6.5);
    assert_eq!(region.lon_min, 110.8);
    assert_eq!(region.lon_max, 114.8);
}

#[test]
fn test_region_deserialize_normalizes() {
    let region: Region =
        serde_yaml::from_str("{ lat_min: 15, lat_max: -15, lon_min: 150, lon_max: 90 }").unwrap();
    assert_eq!(region, Region::indonesia());
}

// ============================================================================
// Dimension tests
// ============================================================================

#[test]
fn test_region_dimensions() {
    let region = Region::indonesia();
    assert_eq!(region.width(), 60.0);
    assert_eq!(region.height(), 30.0);
    assert!(!region.is_degenerate());
}

#[test]
fn test_region_degenerate() {
    let region = Region::new(0.0, 0.0, 100.0, 110.0);
    assert!(region.is_degenerate());
}

// ============================================================================
// Containment tests
// ============================================================================

#[test]
fn test_region_contains_interior_and_edges() {
    let region = Region::indonesia();
    assert!(region.contains(-6.2, 106.8)); // Jakarta
    assert!(region.contains(15.0, 150.0));
    assert!(region.contains(-15.0, 90.0));
}

#[test]
fn test_region_excludes_outside_points() {
    let region = Region::indonesia();
    assert!(!region.contains(35.7, 139.7)); // Tokyo
    assert!(!region.contains(-6.2, 80.0));
}
