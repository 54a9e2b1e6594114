//! Transformations between any two supported CRS codes.
//!
//! Every transform pivots through geographic lon/lat degrees.

use map_common::{BoundingRegion, CrsCode};

use crate::geographic::check_lon_lat;
use crate::transverse_mercator::TransverseMercator;
use crate::{mercator, ProjectionError, Result};

/// Number of samples per edge when transforming a region.
const EDGE_SAMPLES: usize = 21;

/// Source to target coordinate transform.
#[derive(Debug, Clone)]
pub struct CrsTransform {
    from: CrsCode,
    to: CrsCode,
    from_tm: Option<TransverseMercator>,
    to_tm: Option<TransverseMercator>,
}

impl CrsTransform {
    pub fn new(from: CrsCode, to: CrsCode) -> Self {
        Self {
            from,
            to,
            from_tm: tm_for(from),
            to_tm: tm_for(to),
        }
    }

    pub fn source(&self) -> CrsCode {
        self.from
    }

    pub fn target(&self) -> CrsCode {
        self.to
    }

    /// True when source and target are the same system (or datum-equivalent
    /// geographic systems), so coordinates pass through untouched.
    pub fn is_identity(&self) -> bool {
        self.from == self.to || (self.from.is_geographic() && self.to.is_geographic())
    }

    /// Transform a single coordinate.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.is_identity() {
            if !x.is_finite() || !y.is_finite() {
                return Err(ProjectionError::NonFinite { x, y });
            }
            return Ok((x, y));
        }
        let (lon, lat) = self.to_lon_lat(x, y)?;
        self.from_lon_lat(lon, lat)
    }

    /// The same transform running the other way.
    pub fn inverse(&self) -> CrsTransform {
        CrsTransform::new(self.to, self.from)
    }

    /// Transform a region by sampling along its edges.
    ///
    /// The result is the bounding box of the transformed edge samples, so it
    /// contains the whole transformed region for the smooth projections here.
    pub fn transform_region(&self, region: &BoundingRegion) -> Result<BoundingRegion> {
        if self.is_identity() {
            return Ok(BoundingRegion { crs: self.to, ..*region });
        }

        let mut points = Vec::with_capacity(EDGE_SAMPLES * 4);
        for k in 0..EDGE_SAMPLES {
            let t = k as f64 / (EDGE_SAMPLES - 1) as f64;
            let x = region.min_x + t * region.width();
            let y = region.min_y + t * region.height();
            points.push(self.transform(x, region.min_y)?);
            points.push(self.transform(x, region.max_y)?);
            points.push(self.transform(region.min_x, y)?);
            points.push(self.transform(region.max_x, y)?);
        }

        BoundingRegion::from_points(points, self.to)
            .map_err(|e| ProjectionError::InvalidRegion(e.to_string()))
    }

    fn to_lon_lat(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        match (self.from, &self.from_tm) {
            (_, Some(tm)) => tm.inverse(x, y),
            (CrsCode::Epsg3857, _) => {
                if !x.is_finite() || !y.is_finite() {
                    return Err(ProjectionError::NonFinite { x, y });
                }
                Ok(mercator::inverse(x, y))
            }
            _ => {
                check_lon_lat(x, y)?;
                Ok((x, y))
            }
        }
    }

    fn from_lon_lat(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        match (self.to, &self.to_tm) {
            (_, Some(tm)) => tm.forward(lon, lat),
            (CrsCode::Epsg3857, _) => mercator::forward(lon, lat),
            _ => Ok((lon, lat)),
        }
    }
}

fn tm_for(crs: CrsCode) -> Option<TransverseMercator> {
    match crs {
        CrsCode::Nad83Utm(zone) => Some(TransverseMercator::utm(zone, true)),
        CrsCode::Wgs84Utm { zone, north } => Some(TransverseMercator::utm(zone, north)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passthrough() {
        let t = CrsTransform::new(CrsCode::Nad83Utm(19), CrsCode::Nad83Utm(19));
        assert!(t.is_identity());
        assert_eq!(t.transform(345_000.5, 4_765_000.25).unwrap(), (345_000.5, 4_765_000.25));
    }

    #[test]
    fn test_nad83_wgs84_geographic_equivalent() {
        let t = CrsTransform::new(CrsCode::Epsg4269, CrsCode::Epsg4326);
        assert!(t.is_identity());
    }

    #[test]
    fn test_utm_to_mercator_via_lon_lat() {
        let t = CrsTransform::new(CrsCode::Nad83Utm(19), CrsCode::Epsg3857);
        let (x, y) = t.transform(500_000.0, 0.0).unwrap();
        assert!((x - mercator::forward(-69.0, 0.0).unwrap().0).abs() < 1e-3);
        assert!(y.abs() < 1e-3);
    }
}
