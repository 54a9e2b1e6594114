//! Configuration for the grid processor.

use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

/// Values strictly within this distance of zero are clamped to sea level.
pub const DEFAULT_SEA_LEVEL_EPSILON: f32 = 0.1;

/// Configuration for flattening and recoloring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProcessorConfig {
    /// Threshold for the sea-level clamp.
    pub sea_level_epsilon: f32,

    /// Sample count above which flattening runs on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            sea_level_epsilon: DEFAULT_SEA_LEVEL_EPSILON,
            parallel_threshold: 64 * 1024,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SEA_LEVEL_EPSILON") {
            if let Ok(eps) = val.parse() {
                config.sea_level_epsilon = eps;
            }
        }

        if let Ok(val) = std::env::var("FLATTEN_PARALLEL_THRESHOLD") {
            if let Ok(n) = val.parse() {
                config.parallel_threshold = n;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.sea_level_epsilon.is_finite() || self.sea_level_epsilon < 0.0 {
            return Err(GridProcessorError::ConfigError(
                "sea_level_epsilon must be finite and >= 0".to_string(),
            ));
        }
        if self.parallel_threshold == 0 {
            return Err(GridProcessorError::ConfigError(
                "parallel_threshold must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
