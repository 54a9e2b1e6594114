//! Product pipeline: overlays, basemap acquisition, recoloring and rendering.
//!
//! Steps run strictly in order for each product:
//!
//! 1. Load overlays, subset them and repair their polygons.
//! 2. Acquire the basemap, deriving a DEM region from the overlays if needed.
//! 3. Optionally flatten the basemap into samples and clamp sea level.
//! 4. Crop overlays to the map limits and compose the map.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use acquisition::{AcquisitionConfig, HttpFetch};
use anyhow::{Context, Result};
use grid_processor::{clamp_sea_level, flatten_with, GridProcessorConfig};
use map_common::{BoundingRegion, CrsCode, RasterImage};
use overlay::{
    crop, filter_by_attribute, partition_by_attribute, read_point_table, read_shapefile,
    repair_features, FeatureSet,
};
use projection::CrsTransform;
use renderer::{MapBuilder, MapProduct, PointStyle, PolygonStyle, RenderConfig};
use tracing::{info, instrument, warn};

use crate::config::{OverlayConfig, OverlaySource, ProductConfig};

/// A prepared overlay: its features and how to draw them.
#[derive(Debug, Clone)]
pub struct PreparedOverlay {
    pub name: String,
    pub groups: Vec<StyledFeatures>,
}

/// Features sharing one style.
#[derive(Debug, Clone)]
pub struct StyledFeatures {
    pub features: FeatureSet,
    pub style: PolygonStyle,
    pub marker: PointStyle,
}

impl PreparedOverlay {
    /// Bounds of every group, in lon/lat.
    pub fn lon_lat_bounds(&self) -> Result<Option<BoundingRegion>> {
        let mut union: Option<BoundingRegion> = None;
        for group in &self.groups {
            let Some(bounds) = group.features.bounds() else {
                continue;
            };
            let bounds = CrsTransform::new(bounds.crs, CrsCode::Epsg4326).transform_region(&bounds)?;
            union = Some(union.map_or(bounds, |u| u.union(&bounds)));
        }
        Ok(union)
    }
}

/// Builds and renders configured products.
pub struct ProductPipeline {
    fetcher: Arc<dyn HttpFetch>,
    acquisition: AcquisitionConfig,
    grid: GridProcessorConfig,
    render: RenderConfig,
    api_key: Option<String>,
}

impl ProductPipeline {
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        acquisition: AcquisitionConfig,
        render: RenderConfig,
        api_key: Option<String>,
    ) -> Self {
        Self {
            fetcher,
            acquisition,
            grid: GridProcessorConfig::default(),
            render,
            api_key,
        }
    }

    /// Flattening and sea-level settings for raster fills.
    pub fn with_grid(mut self, grid: GridProcessorConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Build, render and write `{output_dir}/{name}.png`.
    pub async fn run(&self, product: &ProductConfig, output_dir: &Path) -> Result<PathBuf> {
        let map = self.build(product).await?;
        let path = output_dir.join(format!("{}.png", product.name));
        map.save_png(&path, &self.render)
            .with_context(|| format!("Failed to render product {}", product.name))?;
        Ok(path)
    }

    /// Assemble the map for one product without rendering it.
    #[instrument(skip(self, product), fields(product = %product.name))]
    pub async fn build(&self, product: &ProductConfig) -> Result<MapProduct> {
        let overlays = product
            .overlays
            .iter()
            .map(prepare_overlay)
            .collect::<Result<Vec<_>>>()?;

        let basemap = match &product.basemap {
            Some(config) => {
                let bounds = overlay_bounds(&overlays)?;
                let request = config.to_request(bounds)?;
                let raster = request
                    .acquire(self.fetcher.clone(), &self.acquisition, self.api_key.as_deref())
                    .await
                    .with_context(|| format!("Failed to acquire basemap for {}", product.name))?;
                Some(raster)
            }
            None => None,
        };

        let mut builder = MapProduct::builder().display(product.display.clone());
        let mut limits = product.display.limits;

        if let Some(raster) = basemap {
            limits = limits.or(Some(raster.extent()));
            builder = add_basemap(builder, product, raster, &self.grid)?;
        }

        for prepared in overlays {
            for group in prepared.groups {
                let features = match (limits, overlay_crops(product, &prepared.name)) {
                    (Some(region), true) => crop(&group.features, &region)
                        .with_context(|| format!("Failed to crop overlay {}", prepared.name))?,
                    _ => group.features,
                };
                let (points, polygons) = split_by_geometry(features);
                if !polygons.is_empty() {
                    builder = builder.polygons(polygons, group.style.clone());
                }
                if !points.is_empty() {
                    builder = builder.points(points, group.marker.clone());
                }
            }
        }

        let map = builder.build();
        info!(layers = map.layers().len(), crs = %map.display_crs(), "Assembled map product");
        Ok(map)
    }
}

fn add_basemap(
    builder: MapBuilder,
    product: &ProductConfig,
    raster: RasterImage,
    grid: &GridProcessorConfig,
) -> Result<MapBuilder> {
    let Some(fill) = &product.raster_fill else {
        return Ok(builder.basemap(raster));
    };

    let samples = flatten_with(&raster, grid).context("Failed to flatten basemap")?;
    let samples = match fill.epsilon(grid) {
        Some(epsilon) => clamp_sea_level(&samples, epsilon).context("Invalid sea level epsilon")?,
        None => samples,
    };

    let builder = if fill.keep_basemap {
        builder.basemap(raster)
    } else {
        builder
    };
    Ok(builder.raster_fill(samples, fill.scale.clone()))
}

fn overlay_crops(product: &ProductConfig, name: &str) -> bool {
    product
        .overlays
        .iter()
        .find(|o| o.name == name)
        .map_or(true, |o| o.crop)
}

fn overlay_bounds(overlays: &[PreparedOverlay]) -> Result<Option<BoundingRegion>> {
    let mut union: Option<BoundingRegion> = None;
    for overlay in overlays {
        if let Some(bounds) = overlay.lon_lat_bounds()? {
            union = Some(union.map_or(bounds, |u| u.union(&bounds)));
        }
    }
    Ok(union)
}

/// Split a set into its point and polygon features.
fn split_by_geometry(set: FeatureSet) -> (FeatureSet, FeatureSet) {
    let crs = set.crs();
    let (points, polygons): (Vec<_>, Vec<_>) = set.into_features().into_iter().partition(|f| f.is_point());
    (
        FeatureSet::with_features(crs, points),
        FeatureSet::with_features(crs, polygons),
    )
}

/// Load one overlay and apply its subset, partition and repair.
pub fn prepare_overlay(config: &OverlayConfig) -> Result<PreparedOverlay> {
    let features = match &config.source {
        OverlaySource::Shapefile { path, crs } => read_shapefile(path, *crs)
            .with_context(|| format!("Failed to load overlay {} from {:?}", config.name, path))?,
        OverlaySource::Points { path, table } => {
            let load = read_point_table(path, table)
                .with_context(|| format!("Failed to load overlay {} from {:?}", config.name, path))?;
            for row in &load.skipped {
                warn!(overlay = %config.name, line = row.line, reason = %row.reason, "Skipped point row");
            }
            load.features
        }
    };

    let features = match &config.subset {
        Some(subset) => filter_by_attribute(&features, &subset.attribute, &subset.value),
        None => features,
    };

    let (features, report) = repair_features(&features);
    if !report.is_clean() {
        warn!(
            overlay = %config.name,
            repaired = report.repaired.len(),
            dropped = report.dropped.len(),
            "Overlay geometry repaired"
        );
    }

    let groups = match &config.partition {
        None => vec![StyledFeatures {
            features,
            style: config.style.clone(),
            marker: config.marker.clone(),
        }],
        Some(partition) => {
            let values: Vec<&str> = partition.groups.iter().map(|g| g.value.as_str()).collect();
            let split = partition_by_attribute(&features, &partition.attribute, &values);
            let mut groups: Vec<StyledFeatures> = partition
                .groups
                .iter()
                .zip(split.subsets)
                .map(|(group, (_, subset))| StyledFeatures {
                    features: subset,
                    style: group.style.clone().unwrap_or_else(|| config.style.clone()),
                    marker: group.marker.clone().unwrap_or_else(|| config.marker.clone()),
                })
                .collect();
            if !split.remainder.is_empty() {
                groups.push(StyledFeatures {
                    features: split.remainder,
                    style: config.style.clone(),
                    marker: config.marker.clone(),
                });
            }
            groups
        }
    };

    info!(
        overlay = %config.name,
        features = groups.iter().map(|g| g.features.len()).sum::<usize>(),
        groups = groups.len(),
        "Prepared overlay"
    );
    Ok(PreparedOverlay {
        name: config.name.clone(),
        groups,
    })
}
