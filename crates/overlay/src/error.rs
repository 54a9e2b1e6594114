//! Error types for overlay loading and preparation.

use std::path::PathBuf;

use map_common::{CrsParseError, MapError};
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while loading or transforming overlays.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// No `.prj` sidecar and no CRS supplied by the caller.
    #[error("{0} has no .prj file and no CRS was assigned")]
    MissingCrs(PathBuf),

    #[error("invalid CRS: {0}")]
    InvalidCrs(#[from] CrsParseError),

    /// A required column is absent from a point table.
    #[error("column {column:?} not found (available: {available:?})")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Result type for overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;
