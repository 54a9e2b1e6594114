//! Geographic (lon/lat) coordinates and the reference ellipsoid.
//!
//! NAD83 and WGS84 are treated as coincident: the datum shift between them
//! is about a meter, well under a pixel at field-map scales.

use crate::{ProjectionError, Result};

/// GRS80 / WGS84 semi-major axis (meters).
pub const SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// GRS80 flattening (NAD83). WGS84 differs only in the 12th digit.
pub const FLATTENING: f64 = 1.0 / 298.257222101;

/// First eccentricity squared.
pub fn eccentricity_squared() -> f64 {
    FLATTENING * (2.0 - FLATTENING)
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// Validate a lon/lat pair before projecting it.
pub fn check_lon_lat(lon: f64, lat: f64) -> Result<()> {
    if !lon.is_finite() || !lat.is_finite() {
        return Err(ProjectionError::NonFinite { x: lon, y: lat });
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ProjectionError::OutOfDomain {
            x: lon,
            y: lat,
            crs: "geographic".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(-70.0), -70.0);
        assert_eq!(normalize_lon(290.0), -70.0);
        assert_eq!(normalize_lon(180.0), 180.0);
        assert_eq!(normalize_lon(-180.0), -180.0);
    }

    #[test]
    fn test_check_lat_range() {
        assert!(check_lon_lat(0.0, 90.0).is_ok());
        assert!(check_lon_lat(0.0, 91.0).is_err());
        assert!(check_lon_lat(f64::NAN, 0.0).is_err());
    }
}
