//! Map rendering for field maps.
//!
//! A [`MapProduct`] stacks a basemap, color-scaled raster fills, polygon
//! overlays and point markers, reconciles them to one display CRS and
//! draws them into an RGBA image with optional axis ticks and a legend.

pub mod colorscale;
pub mod config;
pub mod draw;
pub mod error;
pub mod map;
pub mod render;
pub mod style;
pub mod text;

pub use colorscale::{
    bathymetry_bucket, bathymetry_color, ColorScale, ContinuousScale, DivergingPalette,
    LegendEntry, ResolvedScale, BATHYMETRY_BREAKS, BATHYMETRY_BUCKETS, BATHYMETRY_COLORS,
};
pub use config::RenderConfig;
pub use error::{RenderError, Result};
pub use map::{DisplaySpec, Layer, MapBuilder, MapProduct};
pub use style::{LineStyle, MarkerShape, PointStyle, PolygonStyle};
