//! Transverse Mercator projection on the GRS80 ellipsoid.
//!
//! Used for the UTM zones (NAD83 / UTM zone NN and WGS84 / UTM zone NN).
//! Formulas follow the USGS series expansions (Snyder, Map Projections -
//! A Working Manual, pp. 61-64), accurate to well under a millimeter
//! within a zone.

use crate::geographic::{check_lon_lat, eccentricity_squared, normalize_lon, SEMI_MAJOR_AXIS};
use crate::{ProjectionError, Result};

/// UTM scale factor on the central meridian.
pub const UTM_SCALE_FACTOR: f64 = 0.9996;

/// UTM false easting (meters).
pub const UTM_FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing in the southern hemisphere (meters).
pub const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    /// Central meridian in degrees
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    a: f64,
    e2: f64,
    ep2: f64,
}

impl TransverseMercator {
    pub fn new(lon0: f64, k0: f64, false_easting: f64, false_northing: f64) -> Self {
        let e2 = eccentricity_squared();
        Self {
            lon0,
            k0,
            false_easting,
            false_northing,
            a: SEMI_MAJOR_AXIS,
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Standard UTM zone (1-60).
    pub fn utm(zone: u8, north: bool) -> Self {
        let lon0 = -183.0 + 6.0 * zone as f64;
        let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
        Self::new(lon0, UTM_SCALE_FACTOR, UTM_FALSE_EASTING, false_northing)
    }

    /// Meridian arc length from the equator to latitude `phi` (radians).
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Project lon/lat (degrees) to easting/northing (meters).
    pub fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        check_lon_lat(lon, lat)?;
        let dlon = normalize_lon(lon - self.lon0);
        // The series diverge far from the central meridian
        if dlon.abs() > 45.0 {
            return Err(ProjectionError::OutOfDomain {
                x: lon,
                y: lat,
                crs: format!("transverse mercator lon0={}", self.lon0),
            });
        }

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = self.a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = dlon.to_radians() * cos_phi;
        let m = self.meridian_arc(phi);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a5 / 120.0);
        let y = self.k0
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a6 / 720.0));

        Ok((x + self.false_easting, y + self.false_northing))
    }

    /// Easting/northing (meters) back to lon/lat (degrees).
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64)> {
        if !easting.is_finite() || !northing.is_finite() {
            return Err(ProjectionError::NonFinite {
                x: easting,
                y: northing,
            });
        }

        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let x = easting - self.false_easting;
        let m = (northing - self.false_northing) / self.k0;

        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = phi1.tan();
        let c1 = self.ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = self.a / w.sqrt();
        let r1 = self.a * (1.0 - e2) / w.powf(1.5);
        let d = x / (n1 * self.k0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                * d5
                / 120.0)
            / cos1;

        let lat = phi.to_degrees();
        let lon = normalize_lon(self.lon0 + dlon.to_degrees());
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 {
            return Err(ProjectionError::OutOfDomain {
                x: easting,
                y: northing,
                crs: format!("transverse mercator lon0={}", self.lon0),
            });
        }
        Ok((lon, lat))
    }
}
