//! Bounding region types and operations.

use crate::crs::CrsCode;
use serde::{Deserialize, Serialize};

/// A rectangular extent tagged with the CRS its coordinates are in.
///
/// For geographic CRS (EPSG:4326, EPSG:4269), coordinates are in degrees.
/// For projected CRS (EPSG:3857, UTM), coordinates are in meters.
///
/// Regions built through [`BoundingRegion::new`] always satisfy
/// `min < max` on both axes with finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRegion")]
pub struct BoundingRegion {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    #[serde(default)]
    pub crs: CrsCode,
}

#[derive(Deserialize)]
struct RawRegion {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    #[serde(default)]
    crs: CrsCode,
}

impl TryFrom<RawRegion> for BoundingRegion {
    type Error = BboxError;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        BoundingRegion::new(raw.min_x, raw.min_y, raw.max_x, raw.max_y, raw.crs)
    }
}

impl BoundingRegion {
    /// Create a validated region from corner coordinates.
    pub fn new(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        crs: CrsCode,
    ) -> Result<Self, BboxError> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(BboxError::NonFinite);
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(BboxError::Inverted {
                min_x,
                min_y,
                max_x,
                max_y,
            });
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
            crs,
        })
    }

    /// WGS84 longitude/latitude region.
    pub fn lon_lat(
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Result<Self, BboxError> {
        Self::new(min_lon, min_lat, max_lon, max_lat, CrsCode::Epsg4326)
    }

    /// Smallest region containing all of the given points.
    pub fn from_points<I>(points: I, crs: CrsCode) -> Result<Self, BboxError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (min_x, min_y, max_x, max_y) = points.into_iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), (x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        );
        Self::new(min_x, min_y, max_x, max_y, crs)
    }

    /// Parse a `"minx,miny,maxx,maxy"` string.
    pub fn from_bbox_string(s: &str, crs: CrsCode) -> Result<Self, BboxError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .trim()
                .parse()
                .map_err(|_| BboxError::InvalidNumber(part.to_string()))?;
        }

        Self::new(values[0], values[1], values[2], values[3], crs)
    }

    /// Width of the region in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the region in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if this region intersects another (same CRS assumed).
    pub fn intersects(&self, other: &BoundingRegion) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two regions.
    pub fn intersection(&self, other: &BoundingRegion) -> Option<BoundingRegion> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingRegion {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
            crs: self.crs,
        })
    }

    /// Smallest region containing both.
    pub fn union(&self, other: &BoundingRegion) -> BoundingRegion {
        BoundingRegion {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            crs: self.crs,
        }
    }

    /// Check whether `other` lies entirely inside this region.
    pub fn contains(&self, other: &BoundingRegion) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Check if a point is contained within this region.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Grow the region by a fraction of its size on every side.
    pub fn expand(&self, fraction: f64) -> BoundingRegion {
        let dx = self.width() * fraction;
        let dy = self.height() * fraction;
        BoundingRegion {
            min_x: self.min_x - dx,
            min_y: self.min_y - dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
            crs: self.crs,
        }
    }

    /// The four corners, counter-clockwise from the lower-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BboxError {
    #[error("Invalid bounding box format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in bounding box: {0}")]
    InvalidNumber(String),

    #[error("Bounding box coordinates must be finite")]
    NonFinite,

    #[error("Bounding box min must be below max on both axes: ({min_x}, {min_y}) to ({max_x}, {max_y})")]
    Inverted {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
}
