//! Styles for vector layers.

use map_common::Color;
use serde::{Deserialize, Serialize};

/// Stroke pattern for outlines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    /// `(on, off)` run lengths in pixels for a stroke of `width`.
    pub fn pattern(self, width: f32) -> Option<(f32, f32)> {
        let w = width.max(1.0);
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some((4.0 * w, 3.0 * w)),
            LineStyle::Dotted => Some((w, 2.0 * w)),
        }
    }
}

/// Marker shape for point layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Diamond,
}

/// How a polygon layer is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonStyle {
    /// Interior color, `None` for outline only.
    pub fill: Option<Color>,
    pub outline: Option<Color>,
    pub line_width: f32,
    pub line_style: LineStyle,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill: None,
            outline: Some(Color::BLACK),
            line_width: 1.0,
            line_style: LineStyle::Solid,
        }
    }
}

impl PolygonStyle {
    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn outline(mut self, color: Color, width: f32, style: LineStyle) -> Self {
        self.outline = Some(color);
        self.line_width = width;
        self.line_style = style;
        self
    }

    pub fn no_outline(mut self) -> Self {
        self.outline = None;
        self
    }
}

/// How a point layer is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointStyle {
    pub shape: MarkerShape,
    pub fill: Option<Color>,
    pub outline: Option<Color>,
    /// Marker size in pixels.
    pub size: f32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            shape: MarkerShape::Circle,
            fill: Some(Color::rgb(255, 0, 0)),
            outline: Some(Color::BLACK),
            size: 6.0,
        }
    }
}

impl PointStyle {
    pub fn new(shape: MarkerShape, size: f32) -> Self {
        Self {
            shape,
            size,
            ..Default::default()
        }
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn outline(mut self, color: Option<Color>) -> Self {
        self.outline = color;
        self
    }
}
