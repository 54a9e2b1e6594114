//! Elevation basemaps from Terrarium-encoded tiles.
//!
//! Terrarium tiles are PNGs on the Web Mercator slippy-map pyramid whose RGB
//! channels pack elevation in meters as `R * 256 + G + B / 256 - 32768`.
//! Tiles covering the request are mosaicked and resampled onto a regular
//! lon/lat grid (EPSG:4326).

use std::sync::Arc;

use async_trait::async_trait;
use map_common::{BoundingRegion, CrsCode, GridSpec, RasterImage};
use projection::CrsTransform;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{AcquisitionError, Result};
use crate::http::HttpFetch;
use crate::source::BasemapSource;
use crate::tile::{tiles_per_axis, world_fraction, TileCoord};

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 15;

/// Upper bound on tiles per request.
pub const MAX_TILES: usize = 64;

/// Decode one Terrarium pixel to meters.
pub fn decode_terrarium(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 * 256.0 + g as f32 + b as f32 / 256.0) - 32768.0
}

/// An elevation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemRequest {
    /// Area of interest, in any supported CRS.
    pub region: BoundingRegion,
    /// Tile pyramid level (detail).
    pub zoom: u8,
    /// Crop the result to exactly `region` instead of returning the full
    /// covering tile set.
    #[serde(default)]
    pub clip: bool,
}

impl DemRequest {
    pub fn new(region: BoundingRegion, zoom: u8) -> Self {
        Self {
            region,
            zoom,
            clip: false,
        }
    }

    pub fn clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    /// The region in lon/lat degrees.
    fn lon_lat_region(&self) -> Result<BoundingRegion> {
        CrsTransform::new(self.region.crs, CrsCode::Epsg4326)
            .transform_region(&self.region)
            .map_err(|e| AcquisitionError::InvalidRequest(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(AcquisitionError::InvalidRequest(format!(
                "zoom {} outside {}-{}",
                self.zoom, MIN_ZOOM, MAX_ZOOM
            )));
        }
        Ok(())
    }
}

/// Decoded tiles laid out edge to edge.
struct Mosaic {
    zoom: u8,
    tile_size: u32,
    x0: u32,
    y0: u32,
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Mosaic {
    /// Nearest mosaic sample to a lon/lat position, clamped to the mosaic.
    fn sample(&self, lon: f64, lat: f64) -> Result<f32> {
        let (wx, wy) = world_fraction(lon, lat)?;
        let world_px = (tiles_per_axis(self.zoom) as u64 * self.tile_size as u64) as f64;
        let px = wx * world_px - (self.x0 as u64 * self.tile_size as u64) as f64;
        let py = wy * world_px - (self.y0 as u64 * self.tile_size as u64) as f64;
        let i = (px.floor().max(0.0) as usize).min(self.width - 1);
        let j = (py.floor().max(0.0) as usize).min(self.height - 1);
        Ok(self.values[j * self.width + i])
    }

    /// Resample onto a regular lon/lat grid.
    fn resample(&self, grid: GridSpec) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(grid.len());
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let (lon, lat) = grid
                    .cell_center(i, j)
                    .ok_or_else(|| AcquisitionError::MalformedResponse("cell out of grid".into()))?;
                out.push(self.sample(lon, lat)?);
            }
        }
        Ok(out)
    }
}

/// Terrarium elevation tile source.
pub struct DemSource {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
}

impl DemSource {
    pub fn new(fetcher: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn tile_url(&self, tile: &TileCoord) -> String {
        format!("{}/{}/{}/{}.png", self.base_url, tile.z, tile.x, tile.y)
    }

    async fn fetch_mosaic(&self, zoom: u8, (x0, y0, x1, y1): (u32, u32, u32, u32)) -> Result<Mosaic> {
        let tiles_x = (x1 - x0 + 1) as usize;
        let tiles_y = (y1 - y0 + 1) as usize;
        let mut mosaic: Option<Mosaic> = None;

        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let tile = TileCoord {
                    z: zoom,
                    x: x0 + tx as u32,
                    y: y0 + ty as u32,
                };
                let url = self.tile_url(&tile);
                let body = self.fetcher.get(&url).await?.into_body(&url)?;
                let image = image::load_from_memory(&body)?.to_rgb8();
                if image.width() != image.height() || image.width() == 0 {
                    return Err(AcquisitionError::MalformedResponse(format!(
                        "tile {} is {}x{}, expected a square tile",
                        url,
                        image.width(),
                        image.height()
                    )));
                }

                let m = mosaic.get_or_insert_with(|| {
                    let size = image.width() as usize;
                    Mosaic {
                        zoom,
                        tile_size: image.width(),
                        x0,
                        y0,
                        width: tiles_x * size,
                        height: tiles_y * size,
                        values: vec![f32::NAN; tiles_x * tiles_y * size * size],
                    }
                });
                if image.width() != m.tile_size {
                    return Err(AcquisitionError::MalformedResponse(format!(
                        "tile {} is {} px, other tiles are {} px",
                        url,
                        image.width(),
                        m.tile_size
                    )));
                }

                let size = m.tile_size as usize;
                for (px, py, rgb) in image.enumerate_pixels() {
                    let [r, g, b] = rgb.0;
                    let col = tx * size + px as usize;
                    let row = ty * size + py as usize;
                    m.values[row * m.width + col] = decode_terrarium(r, g, b);
                }
                debug!(z = tile.z, x = tile.x, y = tile.y, "Decoded elevation tile");
            }
        }

        mosaic.ok_or_else(|| AcquisitionError::MalformedResponse("no tiles fetched".into()))
    }
}

#[async_trait]
impl BasemapSource for DemSource {
    type Request = DemRequest;

    fn name(&self) -> &'static str {
        "dem"
    }

    #[instrument(skip(self), fields(source = "dem"))]
    async fn fetch(&self, request: &DemRequest) -> Result<RasterImage> {
        request.validate()?;
        let region = request.lon_lat_region()?;
        let range = TileCoord::covering(&region, request.zoom)?;
        let (x0, y0, x1, y1) = range;
        let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as usize;
        if count > MAX_TILES {
            return Err(AcquisitionError::InvalidRequest(format!(
                "{} tiles needed at zoom {}, limit is {}",
                count, request.zoom, MAX_TILES
            )));
        }

        let mosaic = self.fetch_mosaic(request.zoom, range).await?;

        let grid = if request.clip {
            // Native pixel spacing in degrees at the region's latitude
            let dlon = 360.0 / (tiles_per_axis(request.zoom) as f64 * mosaic.tile_size as f64);
            let dlat = dlon * region.center().1.to_radians().cos();
            let nx = (region.width() / dlon).ceil().max(1.0) as usize;
            let ny = (region.height() / dlat).ceil().max(1.0) as usize;
            GridSpec::new(nx, ny, region)
        } else {
            let nw = TileCoord { z: request.zoom, x: x0, y: y0 }.bounds()?;
            let se = TileCoord { z: request.zoom, x: x1, y: y1 }.bounds()?;
            GridSpec::new(mosaic.width, mosaic.height, nw.union(&se))
        };

        let values = mosaic.resample(grid)?;
        info!(
            tiles = count,
            width = grid.nx,
            height = grid.ny,
            clip = request.clip,
            "Built elevation mosaic"
        );
        Ok(RasterImage::scalar(grid, values, None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::terrarium_encode;

    #[test]
    fn test_decode_terrarium() {
        assert_eq!(decode_terrarium(128, 0, 0), 0.0);
        assert_eq!(decode_terrarium(0, 0, 0), -32768.0);
        assert_eq!(decode_terrarium(128, 100, 128), 100.5);
    }

    #[test]
    fn test_encode_decode_agree() {
        for elev in [-4200.0_f32, -30.5, 0.0, 12.25, 1917.0] {
            let [r, g, b] = terrarium_encode(elev);
            assert_eq!(decode_terrarium(r, g, b), elev);
        }
    }

    #[test]
    fn test_zoom_validation() {
        let region = BoundingRegion::lon_lat(-70.62, 42.98, -70.60, 43.0).unwrap();
        assert!(DemRequest::new(region, 0).validate().is_err());
        assert!(DemRequest::new(region, 16).validate().is_err());
        assert!(DemRequest::new(region, 14).validate().is_ok());
    }
}
