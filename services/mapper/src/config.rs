//! Product configuration for the mapper.
//!
//! A single YAML file lists acquisition, grid and render settings and the
//! map products to build. `${VAR}` and `${VAR:-default}` references are
//! expanded from the environment before parsing.
//!
//! Each settings section starts from its `from_env()` values; keys written
//! in the YAML section replace them one by one.

use std::path::{Path, PathBuf};

use acquisition::{AcquisitionConfig, BasemapRequest, BathymetryRequest, DemRequest, SatelliteRequest};
use anyhow::{Context, Result};
use grid_processor::GridProcessorConfig;
use map_common::{BoundingRegion, CrsCode};
use overlay::PointTableOptions;
use renderer::{ColorScale, DisplaySpec, PointStyle, PolygonStyle, RenderConfig};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Root configuration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MapperConfig {
    #[serde(default = "AcquisitionConfig::from_env", deserialize_with = "acquisition_over_env")]
    pub acquisition: AcquisitionConfig,
    #[serde(default = "GridProcessorConfig::from_env", deserialize_with = "grid_over_env")]
    pub grid: GridProcessorConfig,
    #[serde(default = "RenderConfig::from_env", deserialize_with = "render_over_env")]
    pub render: RenderConfig,
    pub products: Vec<ProductConfig>,
}

impl MapperConfig {
    pub fn product(&self, name: &str) -> Option<&ProductConfig> {
        self.products.iter().find(|p| p.name == name)
    }
}

fn acquisition_over_env<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<AcquisitionConfig, D::Error> {
    merge_over(d, AcquisitionConfig::from_env())
}

fn grid_over_env<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<GridProcessorConfig, D::Error> {
    merge_over(d, GridProcessorConfig::from_env())
}

fn render_over_env<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<RenderConfig, D::Error> {
    merge_over(d, RenderConfig::from_env())
}

/// Replace keys of `base` with those present in the YAML section.
fn merge_over<'de, D, T>(d: D, base: T) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_yaml::to_value(base).map_err(D::Error::custom)?;
    match (&mut merged, serde_yaml::Value::deserialize(d)?) {
        (_, serde_yaml::Value::Null) => {}
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(section)) => {
            for (key, value) in section {
                base.insert(key, value);
            }
        }
        _ => return Err(D::Error::custom("settings section must be a mapping")),
    }
    serde_yaml::from_value(merged).map_err(D::Error::custom)
}

// ============================================================================
// Products
// ============================================================================

/// One output map.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub basemap: Option<BasemapConfig>,
    /// Draw the basemap as colored point samples instead of an image.
    pub raster_fill: Option<RasterFillConfig>,
    #[serde(default)]
    pub overlays: Vec<OverlayConfig>,
    #[serde(default)]
    pub display: DisplaySpec,
}

/// Basemap source with its request parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum BasemapConfig {
    Satellite(SatelliteRequest),
    Dem(DemConfig),
    Bathymetry(BathymetryRequest),
}

fn default_clip() -> bool {
    true
}

/// Elevation request whose region may come from the overlays.
#[derive(Debug, Clone, Deserialize)]
pub struct DemConfig {
    /// Area of interest. Defaults to the bounds of every overlay.
    pub region: Option<BoundingRegion>,
    pub zoom: u8,
    #[serde(default = "default_clip")]
    pub clip: bool,
    /// Fractional padding added around a region derived from overlays.
    #[serde(default)]
    pub padding: f64,
}

impl BasemapConfig {
    /// The concrete request, using `overlay_bounds` for a DEM without a region.
    pub fn to_request(&self, overlay_bounds: Option<BoundingRegion>) -> Result<BasemapRequest> {
        Ok(match self {
            BasemapConfig::Satellite(request) => BasemapRequest::Satellite(request.clone()),
            BasemapConfig::Bathymetry(request) => BasemapRequest::Bathymetry(request.clone()),
            BasemapConfig::Dem(dem) => {
                let region = match (dem.region, overlay_bounds) {
                    (Some(region), _) => region,
                    (None, Some(bounds)) => bounds.expand(dem.padding),
                    (None, None) => anyhow::bail!(
                        "DEM basemap has no region and no overlay bounds to derive one from"
                    ),
                };
                BasemapRequest::Dem(DemRequest::new(region, dem.zoom).clip(dem.clip))
            }
        })
    }
}

fn default_clamp() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RasterFillConfig {
    #[serde(default)]
    pub scale: ColorScale,
    /// Clamp `|value| < epsilon` to sea level before coloring.
    #[serde(default = "default_clamp")]
    pub clamp_sea_level: bool,
    /// Overrides the `grid` section's epsilon for this product.
    pub sea_level_epsilon: Option<f32>,
    /// Keep the basemap image underneath the fill.
    #[serde(default)]
    pub keep_basemap: bool,
}

impl RasterFillConfig {
    /// Epsilon to clamp with, or `None` when clamping is off.
    pub fn epsilon(&self, grid: &GridProcessorConfig) -> Option<f32> {
        self.clamp_sea_level
            .then(|| self.sea_level_epsilon.unwrap_or(grid.sea_level_epsilon))
    }
}

// ============================================================================
// Overlays
// ============================================================================

/// Where overlay features come from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OverlaySource {
    /// Polygon or point shapefile. `crs` is used only when there is no `.prj`.
    Shapefile { path: PathBuf, crs: Option<CrsCode> },
    /// Delimited point table.
    Points {
        path: PathBuf,
        #[serde(default)]
        table: PointTableOptions,
    },
}

/// Keep features whose attribute equals a value.
#[derive(Debug, Clone, Deserialize)]
pub struct SubsetConfig {
    pub attribute: String,
    pub value: String,
}

/// Per-value styling of one attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct PartitionConfig {
    pub attribute: String,
    pub groups: Vec<GroupConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub value: String,
    pub style: Option<PolygonStyle>,
    pub marker: Option<PointStyle>,
}

fn default_crop() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    pub name: String,
    pub source: OverlaySource,
    pub subset: Option<SubsetConfig>,
    pub partition: Option<PartitionConfig>,
    /// Style for polygon features.
    #[serde(default)]
    pub style: PolygonStyle,
    /// Style for point features.
    #[serde(default)]
    pub marker: PointStyle,
    /// Crop to the map limits before drawing.
    #[serde(default = "default_crop")]
    pub crop: bool,
}

// ============================================================================
// Loading
// ============================================================================

/// Load, expand and validate a product file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MapperConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapper config from {:?}", path))?;
    parse_config(&content).with_context(|| format!("Invalid mapper config {:?}", path))
}

/// Expand and parse YAML content.
pub fn parse_config(content: &str) -> Result<MapperConfig> {
    let expanded = shellexpand::env(content).context("Failed to expand environment variables")?;
    let config: MapperConfig =
        serde_yaml::from_str(&expanded).context("Failed to parse mapper config YAML")?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &MapperConfig) -> Result<()> {
    config
        .acquisition
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid acquisition settings")?;
    config.grid.validate().context("Invalid grid settings")?;
    config
        .render
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid render settings")?;

    anyhow::ensure!(!config.products.is_empty(), "No products configured");

    let mut seen = std::collections::HashSet::new();
    for product in &config.products {
        anyhow::ensure!(!product.name.is_empty(), "Product name cannot be empty");
        anyhow::ensure!(
            seen.insert(product.name.as_str()),
            "Duplicate product name: {}",
            product.name
        );
        anyhow::ensure!(
            product.basemap.is_some() || !product.overlays.is_empty(),
            "Product {} has neither a basemap nor overlays",
            product.name
        );
        anyhow::ensure!(
            product.raster_fill.is_none() || product.basemap.is_some(),
            "Product {} has a raster fill but no basemap to flatten",
            product.name
        );
        if let Some(BasemapConfig::Dem(dem)) = &product.basemap {
            anyhow::ensure!(
                dem.region.is_some() || !product.overlays.is_empty(),
                "Product {} needs a DEM region or overlays to derive one from",
                product.name
            );
        }
    }
    Ok(())
}
