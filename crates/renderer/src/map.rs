//! Map products: ordered layers plus display settings.
//!
//! A product is assembled with [`MapProduct::builder`]; every builder step
//! takes the builder by value and hands it back, so a map reads as one
//! chain:
//!
//! ```ignore
//! let map = MapProduct::builder()
//!     .basemap(dem)
//!     .polygons(zones, PolygonStyle::default().fill(Color::rgb(200, 0, 0)))
//!     .points(nests, PointStyle::new(MarkerShape::Triangle, 8.0))
//!     .crs(CrsCode::Epsg4326)
//!     .legend(false)
//!     .build();
//! ```

use grid_processor::PointSamples;
use image::RgbaImage;
use map_common::{BoundingRegion, Color, CrsCode, RasterImage};
use overlay::FeatureSet;
use projection::CrsTransform;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::colorscale::ColorScale;
use crate::config::RenderConfig;
use crate::error::{RenderError, Result};
use crate::render::render;
use crate::style::{PointStyle, PolygonStyle};

/// One drawable layer.
#[derive(Debug, Clone)]
pub enum Layer {
    /// Raster image (satellite RGBA or scalar elevation in grayscale).
    Basemap(RasterImage),
    /// Point samples drawn as filled cells through a color scale.
    RasterFill {
        samples: PointSamples,
        scale: ColorScale,
    },
    Polygons {
        features: FeatureSet,
        style: PolygonStyle,
    },
    Points {
        features: FeatureSet,
        style: PointStyle,
    },
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Basemap(_) => "basemap",
            Layer::RasterFill { .. } => "raster_fill",
            Layer::Polygons { .. } => "polygons",
            Layer::Points { .. } => "points",
        }
    }

    pub fn crs(&self) -> CrsCode {
        match self {
            Layer::Basemap(raster) => raster.crs(),
            Layer::RasterFill { samples, .. } => samples.crs,
            Layer::Polygons { features, .. } | Layer::Points { features, .. } => features.crs(),
        }
    }

    /// Extent in the layer's own CRS.
    pub fn extent(&self) -> Option<BoundingRegion> {
        match self {
            Layer::Basemap(raster) => Some(raster.extent()),
            Layer::RasterFill { samples, .. } => samples.extent(),
            Layer::Polygons { features, .. } | Layer::Points { features, .. } => features.bounds(),
        }
    }
}

/// How the composed map is framed and decorated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySpec {
    /// Display CRS. Defaults to the basemap's, else the first layer's.
    pub crs: Option<CrsCode>,
    /// Axis limits in any CRS. Defaults to the basemap extent, else the
    /// union of the layer extents.
    pub limits: Option<BoundingRegion>,
    pub legend: bool,
    pub legend_title: Option<String>,
    pub axis_labels: bool,
    pub width: u32,
    pub height: u32,
    pub background: Color,
}

impl Default for DisplaySpec {
    fn default() -> Self {
        Self {
            crs: None,
            limits: None,
            legend: true,
            legend_title: None,
            axis_labels: true,
            width: 800,
            height: 600,
            background: Color::WHITE,
        }
    }
}

/// A fully specified map, ready to render.
#[derive(Debug, Clone, Default)]
pub struct MapProduct {
    layers: Vec<Layer>,
    display: DisplaySpec,
}

impl MapProduct {
    pub fn builder() -> MapBuilder {
        MapBuilder::default()
    }

    /// Layers in drawing order, bottom first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn display(&self) -> &DisplaySpec {
        &self.display
    }

    fn basemap(&self) -> Option<&RasterImage> {
        self.layers.iter().find_map(|layer| match layer {
            Layer::Basemap(raster) => Some(raster),
            _ => None,
        })
    }

    /// CRS every layer is reconciled to.
    pub fn display_crs(&self) -> CrsCode {
        self.display
            .crs
            .or_else(|| self.basemap().map(RasterImage::crs))
            .or_else(|| self.layers.first().map(Layer::crs))
            .unwrap_or_default()
    }

    /// Axis limits in the display CRS.
    pub fn limits(&self) -> Result<BoundingRegion> {
        let crs = self.display_crs();
        let to_display = |region: &BoundingRegion| -> Result<BoundingRegion> {
            Ok(CrsTransform::new(region.crs, crs).transform_region(region)?)
        };

        if let Some(limits) = &self.display.limits {
            return to_display(limits);
        }
        if let Some(basemap) = self.basemap() {
            return to_display(&basemap.extent());
        }

        let mut union: Option<BoundingRegion> = None;
        for extent in self.layers.iter().filter_map(Layer::extent) {
            let extent = to_display(&extent)?;
            union = Some(match union {
                Some(u) => u.union(&extent),
                None => extent,
            });
        }
        union.ok_or(RenderError::NothingToRender)
    }

    /// Compose every layer into an RGBA image.
    pub fn render(&self, config: &RenderConfig) -> Result<RgbaImage> {
        render(self, config)
    }

    /// Render and write the map as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>, config: &RenderConfig) -> Result<()> {
        let path = path.as_ref();
        let img = self.render(config)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        img.save_with_format(path, image::ImageFormat::Png)?;
        info!(path = %path.display(), width = img.width(), height = img.height(), "Wrote map");
        Ok(())
    }
}

/// Step-by-step construction of a [`MapProduct`].
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    product: MapProduct,
}

impl MapBuilder {
    pub fn basemap(mut self, raster: RasterImage) -> Self {
        self.product.layers.push(Layer::Basemap(raster));
        self
    }

    pub fn raster_fill(mut self, samples: PointSamples, scale: ColorScale) -> Self {
        self.product.layers.push(Layer::RasterFill { samples, scale });
        self
    }

    pub fn polygons(mut self, features: FeatureSet, style: PolygonStyle) -> Self {
        self.product.layers.push(Layer::Polygons { features, style });
        self
    }

    pub fn points(mut self, features: FeatureSet, style: PointStyle) -> Self {
        self.product.layers.push(Layer::Points { features, style });
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.product.layers.push(layer);
        self
    }

    pub fn crs(mut self, crs: CrsCode) -> Self {
        self.product.display.crs = Some(crs);
        self
    }

    pub fn limits(mut self, region: BoundingRegion) -> Self {
        self.product.display.limits = Some(region);
        self
    }

    pub fn legend(mut self, on: bool) -> Self {
        self.product.display.legend = on;
        self
    }

    pub fn legend_title(mut self, title: impl Into<String>) -> Self {
        self.product.display.legend_title = Some(title.into());
        self
    }

    pub fn axis_labels(mut self, on: bool) -> Self {
        self.product.display.axis_labels = on;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.product.display.width = width;
        self.product.display.height = height;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.product.display.background = color;
        self
    }

    /// Replace every display setting at once.
    pub fn display(mut self, display: DisplaySpec) -> Self {
        self.product.display = display;
        self
    }

    pub fn build(self) -> MapProduct {
        self.product
    }
}
