//! Label text rendering with a TrueType font.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use map_common::Color;
use rusttype::{Font, Scale};
use tracing::warn;

use crate::config::RenderConfig;

/// A loaded font at a fixed pixel size.
pub struct Labeler {
    font: Font<'static>,
    scale: Scale,
}

impl Labeler {
    /// Load the configured font. Returns `None`, with a warning, when no
    /// font is configured or the file cannot be used.
    pub fn from_config(config: &RenderConfig) -> Option<Self> {
        let Some(path) = config.font_path.as_ref() else {
            warn!("No font configured (RENDER_FONT_PATH); skipping map labels");
            return None;
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read font; skipping map labels");
                return None;
            }
        };

        match Font::try_from_vec(bytes) {
            Some(font) => Some(Self {
                font,
                scale: Scale::uniform(config.font_size),
            }),
            None => {
                warn!(path = %path.display(), "Failed to parse font; skipping map labels");
                None
            }
        }
    }

    /// Pixel width and height of `text`.
    pub fn measure(&self, text: &str) -> (i32, i32) {
        text_size(self.scale, &self.font, text)
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, img: &mut RgbaImage, x: i32, y: i32, color: Color, text: &str) {
        draw_text_mut(img, Rgba(color.to_array()), x, y, self.scale, &self.font, text);
    }
}
