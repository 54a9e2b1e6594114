//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

use crate::geographic::{check_lon_lat, SEMI_MAJOR_AXIS};
use crate::Result;

/// Latitude limit where Web Mercator becomes square (arctan(sinh(π))).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the side of the Web Mercator square in meters.
pub const MAX_EXTENT: f64 = 20_037_508.342_789_244;

/// Project lon/lat (degrees) to Web Mercator meters.
///
/// Latitudes beyond ±85.0511° are clamped to the projection limit.
pub fn forward(lon: f64, lat: f64) -> Result<(f64, f64)> {
    check_lon_lat(lon, lat)?;
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = SEMI_MAJOR_AXIS * lon.to_radians();
    let y = SEMI_MAJOR_AXIS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Ok((x, y))
}

/// Web Mercator meters back to lon/lat degrees.
pub fn inverse(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / SEMI_MAJOR_AXIS).to_degrees();
    let lat = (2.0 * (y / SEMI_MAJOR_AXIS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}
