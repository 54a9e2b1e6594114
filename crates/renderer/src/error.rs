//! Error types for map rendering.

use map_common::MapError;
use overlay::OverlayError;
use projection::ProjectionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Nothing to render: no layers and no axis limits")]
    NothingToRender,

    #[error("Invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Invalid color scale: {0}")]
    InvalidScale(String),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Map data error: {0}")]
    Map(#[from] MapError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
