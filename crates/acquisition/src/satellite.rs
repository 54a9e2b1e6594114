//! Satellite imagery from a static-map service.
//!
//! The service renders an image centered on a position at a slippy-map zoom
//! level. The image is framed in Web Mercator, so the raster is tagged
//! EPSG:3857 with its extent derived from center, zoom and pixel size.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use map_common::{BoundingRegion, CrsCode, GridSpec, MapError, RasterImage};
use projection::mercator::{self, MAX_EXTENT, MAX_LATITUDE};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{AcquisitionError, Result};
use crate::http::{redact_key, HttpFetch};
use crate::source::BasemapSource;

pub const MIN_ZOOM: u8 = 1;
pub const MAX_ZOOM: u8 = 21;

/// Largest image side the static-map service renders.
pub const MAX_IMAGE_SIZE: u32 = 640;

/// Map rendering style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    #[default]
    Satellite,
    Terrain,
    Hybrid,
    Roadmap,
}

impl MapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapType::Satellite => "satellite",
            MapType::Terrain => "terrain",
            MapType::Hybrid => "hybrid",
            MapType::Roadmap => "roadmap",
        }
    }
}

/// Endpoint and credential for the static-map service.
#[derive(Clone)]
pub struct SatelliteConfig {
    pub base_url: String,
    pub api_key: String,
}

impl SatelliteConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for SatelliteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SatelliteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"REDACTED")
            .finish()
    }
}

fn default_size() -> u32 {
    MAX_IMAGE_SIZE
}

/// A satellite image request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteRequest {
    pub lon: f64,
    pub lat: f64,
    pub zoom: u8,
    #[serde(default)]
    pub map_type: MapType,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
}

impl SatelliteRequest {
    pub fn new(lon: f64, lat: f64, zoom: u8) -> Self {
        Self {
            lon,
            lat,
            zoom,
            map_type: MapType::default(),
            width: MAX_IMAGE_SIZE,
            height: MAX_IMAGE_SIZE,
        }
    }

    pub fn map_type(mut self, map_type: MapType) -> Self {
        self.map_type = map_type;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.zoom) {
            return Err(AcquisitionError::InvalidRequest(format!(
                "zoom {} outside {}-{}",
                self.zoom, MIN_ZOOM, MAX_ZOOM
            )));
        }
        if !(-180.0..=180.0).contains(&self.lon) || !(-MAX_LATITUDE..=MAX_LATITUDE).contains(&self.lat)
        {
            return Err(AcquisitionError::InvalidRequest(format!(
                "center ({}, {}) outside the Web Mercator domain",
                self.lon, self.lat
            )));
        }
        for side in [self.width, self.height] {
            if side == 0 || side > MAX_IMAGE_SIZE {
                return Err(AcquisitionError::InvalidRequest(format!(
                    "image size {}x{} outside 1-{}",
                    self.width, self.height, MAX_IMAGE_SIZE
                )));
            }
        }
        Ok(())
    }

    /// Web Mercator extent of the rendered image.
    pub fn frame(&self) -> Result<BoundingRegion> {
        let (cx, cy) = mercator::forward(self.lon, self.lat)
            .map_err(|e| AcquisitionError::InvalidRequest(e.to_string()))?;
        let meters_per_px = 2.0 * MAX_EXTENT / (256.0 * (1u64 << self.zoom) as f64);
        let half_w = self.width as f64 / 2.0 * meters_per_px;
        let half_h = self.height as f64 / 2.0 * meters_per_px;
        Ok(BoundingRegion::new(
            cx - half_w,
            cy - half_h,
            cx + half_w,
            cy + half_h,
            CrsCode::Epsg3857,
        )
        .map_err(MapError::from)?)
    }

    fn url(&self, config: &SatelliteConfig) -> String {
        format!(
            "{}?center={},{}&zoom={}&size={}x{}&maptype={}&key={}",
            config.base_url,
            self.lat,
            self.lon,
            self.zoom,
            self.width,
            self.height,
            self.map_type.as_str(),
            config.api_key
        )
    }
}

/// Static-map satellite source.
pub struct SatelliteSource {
    fetcher: Arc<dyn HttpFetch>,
    config: SatelliteConfig,
}

impl SatelliteSource {
    pub fn new(fetcher: Arc<dyn HttpFetch>, config: SatelliteConfig) -> Self {
        Self { fetcher, config }
    }
}

#[async_trait]
impl BasemapSource for SatelliteSource {
    type Request = SatelliteRequest;

    fn name(&self) -> &'static str {
        "satellite"
    }

    #[instrument(skip(self), fields(source = "satellite"))]
    async fn fetch(&self, request: &SatelliteRequest) -> Result<RasterImage> {
        if self.config.api_key.trim().is_empty() {
            return Err(AcquisitionError::MissingApiKey);
        }
        request.validate()?;
        let extent = request.frame()?;

        let url = request.url(&self.config);
        let response = self.fetcher.get(&url).await?;
        if matches!(response.status, 401 | 403) {
            return Err(AcquisitionError::ApiKeyRejected {
                url: redact_key(&url),
                status: response.status,
            });
        }
        let body = response.into_body(&url)?;

        let image = image::load_from_memory(&body)?.to_rgba8();
        debug!(
            width = image.width(),
            height = image.height(),
            bytes = body.len(),
            "Decoded satellite image"
        );

        let grid = GridSpec::new(image.width() as usize, image.height() as usize, extent);
        Ok(RasterImage::rgba(grid, image.into_raw())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    #[test]
    fn test_url_format() {
        let config = SatelliteConfig::new("https://maps.example/staticmap", "k123");
        let request = SatelliteRequest::new(-70.6142, 42.9885, 15)
            .map_type(MapType::Hybrid)
            .size(400, 300);
        assert_eq!(
            request.url(&config),
            "https://maps.example/staticmap?center=42.9885,-70.6142&zoom=15&size=400x300&maptype=hybrid&key=k123"
        );
    }

    #[test]
    fn test_frame_centered() {
        let request = SatelliteRequest::new(0.0, 0.0, 1).size(512, 256);
        let frame = request.frame().unwrap();
        // Zoom 1 world is 512 px wide
        assert_approx_eq!(frame.width(), 2.0 * MAX_EXTENT, 1e-6);
        assert_approx_eq!(frame.center().0, 0.0, 1e-6);
        assert_eq!(frame.crs, CrsCode::Epsg3857);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(SatelliteRequest::new(0.0, 0.0, 0).validate().is_err());
        assert!(SatelliteRequest::new(0.0, 0.0, 22).validate().is_err());
        assert!(SatelliteRequest::new(0.0, 89.0, 10).validate().is_err());
        assert!(SatelliteRequest::new(0.0, 0.0, 10).size(641, 10).validate().is_err());
        assert!(SatelliteRequest::new(0.0, 0.0, 10).validate().is_ok());
    }

    #[test]
    fn test_debug_hides_key() {
        let config = SatelliteConfig::new("https://maps.example", "secret");
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
