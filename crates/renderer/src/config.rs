//! Configuration for the map renderer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Layout and typography settings shared by every rendered map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// TrueType font for tick and legend labels. Labels are skipped without one.
    pub font_path: Option<PathBuf>,

    /// Label font size in pixels.
    pub font_size: f32,

    /// Space reserved left of and below the plot for tick labels.
    pub axis_margin: u32,

    /// Width of the legend panel on the right of the plot.
    pub legend_width: u32,

    /// Target number of ticks per axis.
    pub tick_count: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 12.0,
            axis_margin: 56,
            legend_width: 120,
            tick_count: 5,
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RENDER_FONT_PATH") {
            if !val.is_empty() {
                config.font_path = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("RENDER_FONT_SIZE") {
            if let Ok(size) = val.parse() {
                config.font_size = size;
            }
        }

        if let Ok(val) = std::env::var("RENDER_LEGEND_WIDTH") {
            if let Ok(width) = val.parse() {
                config.legend_width = width;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err("font_size must be > 0".to_string());
        }
        if self.tick_count < 2 {
            return Err("tick_count must be >= 2".to_string());
        }
        Ok(())
    }
}
