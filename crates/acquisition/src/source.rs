//! The basemap source abstraction and the request selector.

use std::sync::Arc;

use async_trait::async_trait;
use map_common::RasterImage;
use serde::Deserialize;
use tracing::info;

use crate::bathymetry::{BathymetryRequest, BathymetrySource};
use crate::config::AcquisitionConfig;
use crate::dem::{DemRequest, DemSource};
use crate::error::{AcquisitionError, Result};
use crate::http::HttpFetch;
use crate::satellite::{SatelliteConfig, SatelliteRequest, SatelliteSource};

/// A service that turns a request into a georeferenced raster.
///
/// Implementations fail with no partial result; nothing is cached between
/// calls.
#[async_trait]
pub trait BasemapSource: Send + Sync {
    type Request: Send + Sync;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self, request: &Self::Request) -> Result<RasterImage>;
}

/// Source selector with its request parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum BasemapRequest {
    Satellite(SatelliteRequest),
    Dem(DemRequest),
    Bathymetry(BathymetryRequest),
}

impl BasemapRequest {
    /// Dispatch to the matching source.
    ///
    /// `api_key` is only consulted for satellite requests.
    pub async fn acquire(
        &self,
        fetcher: Arc<dyn HttpFetch>,
        config: &AcquisitionConfig,
        api_key: Option<&str>,
    ) -> Result<RasterImage> {
        let raster = match self {
            BasemapRequest::Satellite(request) => {
                let key = api_key.ok_or(AcquisitionError::MissingApiKey)?;
                let satellite = SatelliteConfig::new(&config.satellite_url, key);
                SatelliteSource::new(fetcher, satellite).fetch(request).await?
            }
            BasemapRequest::Dem(request) => {
                DemSource::new(fetcher, &config.dem_url).fetch(request).await?
            }
            BasemapRequest::Bathymetry(request) => {
                BathymetrySource::new(fetcher, &config.bathymetry_url)
                    .fetch(request)
                    .await?
            }
        };

        info!(
            width = raster.width(),
            height = raster.height(),
            crs = %raster.crs(),
            "Acquired basemap"
        );
        Ok(raster)
    }
}
