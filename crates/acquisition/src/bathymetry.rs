//! Bathymetric grids from an ERDDAP griddap service.
//!
//! The default dataset is the ETOPO 1 arc-minute global relief grid: values
//! are meters, positive above sea level and negative below. Striding the
//! native grid by `resolution` gives spacing in whole arc-minutes.

use std::sync::Arc;

use async_trait::async_trait;
use map_common::{CrsCode, GridSpec, RasterImage};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{AcquisitionError, Result};
use crate::http::HttpFetch;
use crate::source::BasemapSource;

/// Variable queried from the griddap dataset.
pub const ALTITUDE_VARIABLE: &str = "altitude";

fn default_resolution() -> u32 {
    1
}

/// A bathymetry request in lon/lat degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BathymetryRequest {
    pub lon1: f64,
    pub lon2: f64,
    pub lat1: f64,
    pub lat2: f64,
    /// Grid spacing in arc-minutes.
    #[serde(default = "default_resolution")]
    pub resolution: u32,
}

impl BathymetryRequest {
    pub fn new(lon1: f64, lon2: f64, lat1: f64, lat2: f64, resolution: u32) -> Self {
        Self {
            lon1,
            lon2,
            lat1,
            lat2,
            resolution,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let coords = [self.lon1, self.lon2, self.lat1, self.lat2];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(AcquisitionError::InvalidRequest(
                "bathymetry bounds must be finite".to_string(),
            ));
        }
        if self.lon1 >= self.lon2 || self.lat1 >= self.lat2 {
            return Err(AcquisitionError::InvalidRequest(format!(
                "bounds lon {}..{} lat {}..{} are inverted or empty",
                self.lon1, self.lon2, self.lat1, self.lat2
            )));
        }
        if self.lon1 < -180.0 || self.lon2 > 180.0 || self.lat1 < -90.0 || self.lat2 > 90.0 {
            return Err(AcquisitionError::InvalidRequest(format!(
                "bounds lon {}..{} lat {}..{} exceed lon/lat ranges",
                self.lon1, self.lon2, self.lat1, self.lat2
            )));
        }
        if self.resolution < 1 {
            return Err(AcquisitionError::InvalidRequest(
                "resolution must be at least 1 arc-minute".to_string(),
            ));
        }
        Ok(())
    }

    /// griddap CSV query for this request.
    pub fn url(&self, base_url: &str) -> String {
        let s = self.resolution;
        format!(
            "{}.csv?{}[({}):{}:({})][({}):{}:({})]",
            base_url.trim_end_matches('/'),
            ALTITUDE_VARIABLE,
            self.lat1,
            s,
            self.lat2,
            self.lon1,
            s,
            self.lon2
        )
    }
}

/// Parse a griddap CSV response into a north-up scalar raster.
///
/// The first header row names the columns; griddap follows it with a units
/// row, which is skipped. Rows may come in any order but must fill the grid.
pub fn parse_griddap_csv(body: &[u8]) -> Result<RasterImage> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| AcquisitionError::MalformedResponse(format!("missing {} column", name)))
    };
    let lat_col = column("latitude")?;
    let lon_col = column("longitude")?;
    let value_col = (0..headers.len())
        .find(|c| *c != lat_col && *c != lon_col)
        .ok_or_else(|| AcquisitionError::MalformedResponse("missing value column".into()))?;

    let mut rows: Vec<(f64, f64, f32)> = Vec::new();
    for (n, record) in reader.records().enumerate() {
        let record = record?;
        let field = |c: usize| record.get(c).unwrap_or("");
        let lat = field(lat_col).parse::<f64>();
        let lon = field(lon_col).parse::<f64>();
        let (lat, lon) = match (lat, lon) {
            (Ok(lat), Ok(lon)) => (lat, lon),
            // Units row
            _ if n == 0 => continue,
            _ => {
                return Err(AcquisitionError::MalformedResponse(format!(
                    "row {} has non-numeric coordinates",
                    n + 2
                )))
            }
        };
        let value = field(value_col).parse::<f32>().unwrap_or(f32::NAN);
        rows.push((lat, lon, value));
    }

    let axis = |pick: fn(&(f64, f64, f32)) -> f64| {
        let mut values: Vec<f64> = rows.iter().map(pick).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        values
    };
    let lats = axis(|r: &(f64, f64, f32)| r.0);
    let lons = axis(|r: &(f64, f64, f32)| r.1);
    let (nx, ny) = (lons.len(), lats.len());
    if nx < 2 || ny < 2 {
        return Err(AcquisitionError::MalformedResponse(format!(
            "grid of {}x{} cells is too small to georeference",
            nx, ny
        )));
    }
    if rows.len() != nx * ny {
        return Err(AcquisitionError::MalformedResponse(format!(
            "{} rows do not fill a {}x{} grid",
            rows.len(),
            nx,
            ny
        )));
    }

    let mut values = vec![f32::NAN; nx * ny];
    for (lat, lon, value) in &rows {
        let i = lons.partition_point(|x| x < lon);
        // Row 0 is the northernmost latitude
        let j = ny - 1 - lats.partition_point(|y| y < lat);
        values[j * nx + i] = *value;
    }

    let grid = GridSpec::from_cell_centers(
        nx,
        ny,
        (lons[0], lats[ny - 1]),
        (lons[nx - 1], lats[0]),
        CrsCode::Epsg4326,
    )?;
    Ok(RasterImage::scalar(grid, values, None)?)
}

/// ERDDAP griddap bathymetry source.
pub struct BathymetrySource {
    fetcher: Arc<dyn HttpFetch>,
    base_url: String,
}

impl BathymetrySource {
    pub fn new(fetcher: Arc<dyn HttpFetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl BasemapSource for BathymetrySource {
    type Request = BathymetryRequest;

    fn name(&self) -> &'static str {
        "bathymetry"
    }

    #[instrument(skip(self), fields(source = "bathymetry"))]
    async fn fetch(&self, request: &BathymetryRequest) -> Result<RasterImage> {
        request.validate()?;
        let url = request.url(&self.base_url);
        let body = self.fetcher.get(&url).await?.into_body(&url)?;
        let raster = parse_griddap_csv(&body)?;

        let missing = match &raster.data {
            map_common::RasterData::Scalar(v) => v.iter().filter(|x| x.is_nan()).count(),
            map_common::RasterData::Rgba(_) => 0,
        };
        if missing > 0 {
            warn!(missing, "Bathymetry grid has missing cells");
        }
        info!(
            width = raster.width(),
            height = raster.height(),
            bytes = body.len(),
            "Parsed bathymetry grid"
        );
        Ok(raster)
    }
}
