//! Coordinate reference system transformations.
//!
//! Implements the projections used by field maps from scratch without
//! external dependencies: geographic lon/lat, Web Mercator and
//! Transverse Mercator (UTM zones).

pub mod geographic;
pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use transform::CrsTransform;
pub use transverse_mercator::TransverseMercator;

use thiserror::Error;

/// Errors raised while transforming coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("Coordinate ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { x: f64, y: f64, crs: String },

    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("Invalid region after transform: {0}")]
    InvalidRegion(String),
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
