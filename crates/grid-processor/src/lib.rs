//! Raster-to-point flattening and sea-level recoloring.
//!
//! Converts gridded elevation/depth rasters into flat `(x, y, value)` tables
//! suitable for cell-based rendering, and clamps near-zero values into a
//! single sea-level bucket so the background colors uniformly.
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{flatten, clamp_sea_level, DEFAULT_SEA_LEVEL_EPSILON};
//!
//! let samples = flatten(&dem)?;
//! let recolored = clamp_sea_level(&samples, DEFAULT_SEA_LEVEL_EPSILON)?;
//! ```

pub mod config;
pub mod error;
pub mod flatten;
pub mod points;

pub use config::{GridProcessorConfig, DEFAULT_SEA_LEVEL_EPSILON};
pub use error::{GridProcessorError, Result};
pub use flatten::{clamp_sea_level, flatten, flatten_with};
pub use points::{PointSample, PointSamples};
