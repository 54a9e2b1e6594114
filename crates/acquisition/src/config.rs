//! Configuration for basemap acquisition.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default static-map endpoint for satellite imagery.
pub const DEFAULT_SATELLITE_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Default Terrarium elevation tile endpoint (AWS Open Data).
pub const DEFAULT_DEM_URL: &str = "https://s3.amazonaws.com/elevation-tiles-prod/terrarium";

/// Default ERDDAP griddap dataset for the ETOPO 1 arc-minute relief grid.
pub const DEFAULT_BATHYMETRY_URL: &str = "https://coastwatch.pfeg.noaa.gov/erddap/griddap/etopo180";

/// Service endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with every request. Tile services reject anonymous clients.
    pub user_agent: String,

    pub satellite_url: String,
    pub dem_url: String,
    pub bathymetry_url: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: format!("field-maps/{}", env!("CARGO_PKG_VERSION")),
            satellite_url: DEFAULT_SATELLITE_URL.to_string(),
            dem_url: DEFAULT_DEM_URL.to_string(),
            bathymetry_url: DEFAULT_BATHYMETRY_URL.to_string(),
        }
    }
}

impl AcquisitionConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ACQUISITION_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.timeout_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("ACQUISITION_USER_AGENT") {
            config.user_agent = val;
        }
        if let Ok(val) = std::env::var("SATELLITE_BASE_URL") {
            config.satellite_url = val;
        }
        if let Ok(val) = std::env::var("DEM_TILE_URL") {
            config.dem_url = val;
        }
        if let Ok(val) = std::env::var("BATHYMETRY_URL") {
            config.bathymetry_url = val;
        }

        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".to_string());
        }
        for (name, url) in [
            ("satellite_url", &self.satellite_url),
            ("dem_url", &self.dem_url),
            ("bathymetry_url", &self.bathymetry_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!("{} must be an http(s) URL, got {:?}", name, url));
            }
        }
        Ok(())
    }
}
