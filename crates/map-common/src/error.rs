//! Error types shared by the field-map crates.

use thiserror::Error;

use crate::bbox::BboxError;
use crate::crs::CrsParseError;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Errors raised by the common data model.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Invalid bounding region: {0}")]
    InvalidBbox(#[from] BboxError),

    #[error("Invalid CRS: {0}")]
    InvalidCrs(#[from] CrsParseError),

    #[error("Raster has {actual} samples but {width}x{height} grid needs {expected}")]
    RasterSizeMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Raster is empty")]
    EmptyRaster,

    #[error("Invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("Region {requested} does not overlap raster extent {extent}")]
    NoOverlap { requested: String, extent: String },
}
