//! Slippy-map tile addressing.
//!
//! Tiles follow the OpenStreetMap convention: `x` counts columns eastward
//! from 180°W and `y` counts rows southward from the Web Mercator limit, with
//! `2^z` tiles per axis at zoom `z`.

use map_common::{BoundingRegion, MapError};
use projection::mercator::{self, MAX_EXTENT, MAX_LATITUDE};

use crate::error::{AcquisitionError, Result};

/// Tile coordinates `(z, x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Tile containing a lon/lat position.
    pub fn from_lon_lat(lon: f64, lat: f64, z: u8) -> Result<Self> {
        let (wx, wy) = world_fraction(lon, lat)?;
        let n = tiles_per_axis(z);
        let max = (n - 1) as f64;
        Ok(Self {
            z,
            x: (wx * n as f64).floor().clamp(0.0, max) as u32,
            y: (wy * n as f64).floor().clamp(0.0, max) as u32,
        })
    }

    /// Lon/lat bounds of this tile.
    pub fn bounds(&self) -> Result<BoundingRegion> {
        let n = tiles_per_axis(self.z) as f64;
        let (west, north) = world_to_lon_lat(self.x as f64 / n, self.y as f64 / n);
        let (east, south) = world_to_lon_lat((self.x + 1) as f64 / n, (self.y + 1) as f64 / n);
        Ok(BoundingRegion::lon_lat(west, south, east, north).map_err(MapError::from)?)
    }

    /// Inclusive tile ranges `(x0, y0, x1, y1)` covering a lon/lat region.
    pub fn covering(region: &BoundingRegion, z: u8) -> Result<(u32, u32, u32, u32)> {
        let nw = Self::from_lon_lat(region.min_x, region.max_y, z)?;
        let se = Self::from_lon_lat(region.max_x, region.min_y, z)?;
        Ok((nw.x, nw.y, se.x, se.y))
    }
}

/// Number of tiles along one axis at zoom `z`.
pub fn tiles_per_axis(z: u8) -> u32 {
    1u32 << z
}

/// Position as a fraction of the Web Mercator square, `(0, 0)` at the
/// north-west corner.
pub fn world_fraction(lon: f64, lat: f64) -> Result<(f64, f64)> {
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(AcquisitionError::InvalidRequest(format!(
            "position ({}, {}) is outside lon/lat ranges",
            lon, lat
        )));
    }
    let (x, y) = mercator::forward(lon, lat.clamp(-MAX_LATITUDE, MAX_LATITUDE))
        .map_err(|e| AcquisitionError::InvalidRequest(e.to_string()))?;
    Ok((
        (x + MAX_EXTENT) / (2.0 * MAX_EXTENT),
        (MAX_EXTENT - y) / (2.0 * MAX_EXTENT),
    ))
}

/// Inverse of [`world_fraction`].
pub fn world_to_lon_lat(wx: f64, wy: f64) -> (f64, f64) {
    mercator::inverse(
        wx * 2.0 * MAX_EXTENT - MAX_EXTENT,
        MAX_EXTENT - wy * 2.0 * MAX_EXTENT,
    )
}
