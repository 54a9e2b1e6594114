//! Round-trip and scenario tests for CRS transforms.

use map_common::{BoundingRegion, CrsCode};
use projection::{CrsTransform, TransverseMercator};
use test_utils::{assert_approx_eq, assert_coords_approx_eq};

// ============================================================================
// UTM round trips
// ============================================================================

#[test]
fn test_utm_roundtrip_gulf_of_maine() {
    let tm = TransverseMercator::utm(19, true);
    for &(lon, lat) in &[(-70.6142, 42.9885), (-69.0, 44.5), (-67.2, 41.0), (-71.9, 45.9)] {
        let (e, n) = tm.forward(lon, lat).unwrap();
        let (lon2, lat2) = tm.inverse(e, n).unwrap();
        assert_coords_approx_eq!((lon2, lat2), (lon, lat), 1e-6);
    }
}

#[test]
fn test_utm_southern_roundtrip() {
    let tm = TransverseMercator::utm(56, false);
    let (e, n) = tm.forward(151.2, -33.9).unwrap();
    let (lon, lat) = tm.inverse(e, n).unwrap();
    assert_coords_approx_eq!((lon, lat), (151.2, -33.9), 1e-6);
}

#[test]
fn test_utm_easting_symmetry() {
    // Points mirrored across the central meridian mirror around 500 km
    let tm = TransverseMercator::utm(19, true);
    let (e_west, n_west) = tm.forward(-70.0, 43.0).unwrap();
    let (e_east, n_east) = tm.forward(-68.0, 43.0).unwrap();
    assert_approx_eq!(e_west + e_east, 1_000_000.0, 1e-6);
    assert_approx_eq!(n_west, n_east, 1e-6);
}

// ============================================================================
// CrsTransform
// ============================================================================

#[test]
fn test_same_crs_is_noop() {
    for crs in [
        CrsCode::Epsg4326,
        CrsCode::Epsg3857,
        CrsCode::Nad83Utm(19),
        CrsCode::Wgs84Utm { zone: 18, north: true },
    ] {
        let t = CrsTransform::new(crs, crs);
        let (x, y) = t.transform(12.345, 67.89).unwrap();
        assert_eq!((x, y), (12.345, 67.89));
    }
}

#[test]
fn test_utm_to_wgs84_ranges() {
    let t = CrsTransform::new(CrsCode::Nad83Utm(19), CrsCode::Epsg4326);
    let (lon, lat) = t.transform(349_500.0, 4_761_000.0).unwrap();
    assert!((-180.0..=180.0).contains(&lon));
    assert!((-90.0..=90.0).contains(&lat));
    // Isles of Shoals area, west of the zone 19 central meridian
    assert!(lon < -69.0 && lon > -72.0);
    assert!(lat > 42.0 && lat < 44.0);
}

#[test]
fn test_mercator_roundtrip_through_transform() {
    let fwd = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
    let inv = fwd.inverse();
    let (x, y) = fwd.transform(-70.6, 42.99).unwrap();
    let (lon, lat) = inv.transform(x, y).unwrap();
    assert_coords_approx_eq!((lon, lat), (-70.6, 42.99), 1e-9);
}

#[test]
fn test_region_transform_contains_corners() {
    let region = BoundingRegion::lon_lat(-70.619, 42.9842, -70.6094, 42.9928).unwrap();
    let t = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Nad83Utm(19));
    let utm = t.transform_region(&region).unwrap();
    assert_eq!(utm.crs, CrsCode::Nad83Utm(19));
    for (x, y) in region.corners() {
        let (e, n) = t.transform(x, y).unwrap();
        assert!(utm.contains_point(e, n));
    }
    // Roughly 780 m wide and 950 m tall
    assert!(utm.width() > 700.0 && utm.width() < 900.0);
    assert!(utm.height() > 900.0 && utm.height() < 1000.0);
}

#[test]
fn test_rejects_invalid_latitude() {
    let t = CrsTransform::new(CrsCode::Epsg4326, CrsCode::Epsg3857);
    assert!(t.transform(0.0, 95.0).is_err());
}
