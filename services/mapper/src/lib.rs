//! Field map product builder.
//!
//! Reads a YAML product file, acquires basemaps, loads survey overlays and
//! writes one PNG per configured product.

pub mod config;
pub mod pipeline;

pub use config::{load_config, parse_config, MapperConfig, ProductConfig};
pub use pipeline::{prepare_overlay, PreparedOverlay, ProductPipeline, StyledFeatures};
