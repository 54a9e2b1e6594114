//! Common types shared across the field-map crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod raster;
pub mod style;

pub use bbox::{BboxError, BoundingRegion};
pub use crs::{CrsCode, CrsParseError};
pub use error::{MapError, MapResult};
pub use grid::GridSpec;
pub use raster::{RasterData, RasterImage};
pub use style::Color;
