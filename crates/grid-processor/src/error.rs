//! Error types for grid processing.

use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Only scalar rasters carry values that can be flattened.
    #[error("raster holds RGBA samples; only scalar rasters can be flattened")]
    NotScalar,

    /// The sea-level threshold must be a finite, non-negative number.
    #[error("invalid sea-level epsilon {0}: must be finite and >= 0")]
    InvalidEpsilon(f32),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
