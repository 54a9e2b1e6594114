//! Color scales for raster fills.
//!
//! Two families are supported:
//!
//! - **Bathymetry buckets**: fixed depth intervals, each with a fixed blue.
//!   Breakpoints run `0, -30, -55, ..., -3180, -inf` and every interval is
//!   half-open `(lower, upper]`. Index 0 is the deepest (darkest) bucket.
//! - **Diverging ramps**: an 11-class ColorBrewer palette, reversed unless
//!   `reverse: false`, interpolated into `steps` colors of which an inclusive index
//!   window is kept. Values map linearly across the kept colors.

use crate::error::{RenderError, Result};
use map_common::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Depth breakpoints in meters, shallow to deep.
pub const BATHYMETRY_BREAKS: [f32; 14] = [
    0.0,
    -30.0,
    -55.0,
    -75.0,
    -90.0,
    -120.0,
    -150.0,
    -180.0,
    -780.0,
    -1380.0,
    -1980.0,
    -2580.0,
    -3180.0,
    f32::NEG_INFINITY,
];

/// Number of bathymetry buckets.
pub const BATHYMETRY_BUCKETS: usize = BATHYMETRY_BREAKS.len() - 1;

/// Bucket colors, deepest first.
pub const BATHYMETRY_COLORS: [Color; BATHYMETRY_BUCKETS] = [
    Color::rgb(0x08, 0x1D, 0x58),
    Color::rgb(0x0B, 0x2A, 0x6B),
    Color::rgb(0x0C, 0x3A, 0x7E),
    Color::rgb(0x12, 0x4B, 0x91),
    Color::rgb(0x1A, 0x5D, 0xA3),
    Color::rgb(0x21, 0x71, 0xB5),
    Color::rgb(0x31, 0x82, 0xBD),
    Color::rgb(0x42, 0x92, 0xC6),
    Color::rgb(0x6B, 0xAE, 0xD6),
    Color::rgb(0x9E, 0xCA, 0xE1),
    Color::rgb(0xBD, 0xD7, 0xE7),
    Color::rgb(0xC6, 0xDB, 0xEF),
    Color::rgb(0xDE, 0xEB, 0xF7),
];

/// Bucket index for a depth, 0 = deepest.
///
/// Land (`> 0`) and `NaN` have no bucket.
pub fn bathymetry_bucket(value: f32) -> Option<usize> {
    if value.is_nan() || value > 0.0 {
        return None;
    }
    // Interval k (shallow-first) is (BREAKS[k + 1], BREAKS[k]]
    let k = (0..BATHYMETRY_BUCKETS)
        .find(|&k| value > BATHYMETRY_BREAKS[k + 1])
        .unwrap_or(BATHYMETRY_BUCKETS - 1);
    Some(BATHYMETRY_BUCKETS - 1 - k)
}

pub fn bathymetry_color(value: f32) -> Option<Color> {
    bathymetry_bucket(value).map(|idx| BATHYMETRY_COLORS[idx])
}

/// Legend label for a bathymetry bucket.
fn bathymetry_label(index: usize) -> String {
    let k = BATHYMETRY_BUCKETS - 1 - index;
    let upper = BATHYMETRY_BREAKS[k];
    let lower = BATHYMETRY_BREAKS[k + 1];
    if lower.is_infinite() {
        format!("{} and deeper", upper)
    } else {
        format!("{} to {}", lower, upper)
    }
}

/// Named 11-class diverging palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DivergingPalette {
    Spectral,
    RdYlBu,
    RdBu,
    BrBG,
}

impl DivergingPalette {
    /// The 11 ColorBrewer class colors, low end first.
    pub fn classes(self) -> [Color; 11] {
        let hex: [u32; 11] = match self {
            DivergingPalette::Spectral => [
                0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4,
                0x66c2a5, 0x3288bd, 0x5e4fa2,
            ],
            DivergingPalette::RdYlBu => [
                0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee090, 0xffffbf, 0xe0f3f8, 0xabd9e9,
                0x74add1, 0x4575b4, 0x313695,
            ],
            DivergingPalette::RdBu => [
                0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de,
                0x4393c3, 0x2166ac, 0x053061,
            ],
            DivergingPalette::BrBG => [
                0x543005, 0x8c510a, 0xbf812d, 0xdfc27d, 0xf6e8c3, 0xf5f5f5, 0xc7eae5, 0x80cdc1,
                0x35978f, 0x01665e, 0x003c30,
            ],
        };
        hex.map(|h| Color::rgb((h >> 16) as u8, (h >> 8) as u8, h as u8))
    }
}

impl FromStr for DivergingPalette {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "spectral" => Ok(DivergingPalette::Spectral),
            "rdylbu" => Ok(DivergingPalette::RdYlBu),
            "rdbu" => Ok(DivergingPalette::RdBu),
            "brbg" => Ok(DivergingPalette::BrBG),
            _ => Err(RenderError::InvalidScale(format!("unknown palette '{}'", s))),
        }
    }
}

impl fmt::Display for DivergingPalette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Interpolate `anchors` into `n` evenly spaced colors.
///
/// The first and last output colors equal the first and last anchors.
pub fn ramp(anchors: &[Color], n: usize) -> Vec<Color> {
    match (anchors.len(), n) {
        (0, _) | (_, 0) => Vec::new(),
        (1, _) | (_, 1) => vec![anchors[0]; n],
        (m, _) => (0..n)
            .map(|k| {
                let pos = k as f32 / (n - 1) as f32 * (m - 1) as f32;
                let i = (pos.floor() as usize).min(m - 2);
                anchors[i].lerp(anchors[i + 1], pos - i as f32)
            })
            .collect(),
    }
}

/// A diverging ramp mapped linearly over a value range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousScale {
    pub palette: DivergingPalette,
    /// Run the palette high end first, so low values take its last class.
    pub reverse: bool,
    /// Number of interpolated colors before the index window is applied.
    pub steps: usize,
    /// Inclusive `(first, last)` indices kept from the interpolated ramp.
    pub index_range: (usize, usize),
    /// Value mapped to the first kept color. Defaults to the data minimum.
    pub min: Option<f32>,
    /// Value mapped to the last kept color. Defaults to the data maximum.
    pub max: Option<f32>,
}

impl Default for ContinuousScale {
    fn default() -> Self {
        Self {
            palette: DivergingPalette::Spectral,
            reverse: true,
            steps: 100,
            index_range: (30, 89),
            min: None,
            max: None,
        }
    }
}

impl ContinuousScale {
    pub fn new(palette: DivergingPalette) -> Self {
        Self {
            palette,
            ..Default::default()
        }
    }

    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn index_range(mut self, first: usize, last: usize) -> Self {
        self.index_range = (first, last);
        self
    }

    pub fn limits(mut self, min: f32, max: f32) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// The kept colors, low end first.
    pub fn colors(&self) -> Result<Vec<Color>> {
        let (first, last) = self.index_range;
        if first > last || last >= self.steps {
            return Err(RenderError::InvalidScale(format!(
                "index range [{}, {}] outside 0..{}",
                first, last, self.steps
            )));
        }
        let mut classes = self.palette.classes();
        if self.reverse {
            classes.reverse();
        }
        let full = ramp(&classes, self.steps);
        Ok(full[first..=last].to_vec())
    }
}

/// Color scale attached to a raster fill layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ColorScale {
    /// Fixed depth buckets. Land cells take `land` or stay unpainted.
    Bathymetry {
        #[serde(default)]
        land: Option<Color>,
    },
    Diverging(ContinuousScale),
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale::Bathymetry { land: None }
    }
}

impl ColorScale {
    pub fn diverging(palette: DivergingPalette) -> Self {
        ColorScale::Diverging(ContinuousScale::new(palette))
    }

    /// Fix the scale against the data it will color.
    ///
    /// `data_range` fills in whichever continuous limits were left unset.
    pub fn resolve(&self, data_range: Option<(f32, f32)>) -> Result<ResolvedScale> {
        match self {
            ColorScale::Bathymetry { land } => Ok(ResolvedScale::Bathymetry { land: *land }),
            ColorScale::Diverging(scale) => {
                let colors = scale.colors()?;
                let (data_min, data_max) = data_range.unwrap_or((0.0, 1.0));
                let min = scale.min.unwrap_or(data_min);
                let max = scale.max.unwrap_or(data_max);
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(RenderError::InvalidScale(format!(
                        "invalid limits [{}, {}]",
                        min, max
                    )));
                }
                Ok(ResolvedScale::Linear { colors, min, max })
            }
        }
    }
}

/// One row of a legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

/// A color scale with every parameter fixed.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedScale {
    Bathymetry { land: Option<Color> },
    Linear { colors: Vec<Color>, min: f32, max: f32 },
}

impl ResolvedScale {
    pub fn color(&self, value: f32) -> Option<Color> {
        if value.is_nan() {
            return None;
        }
        match self {
            ResolvedScale::Bathymetry { land } => {
                if value > 0.0 {
                    *land
                } else {
                    bathymetry_color(value)
                }
            }
            ResolvedScale::Linear { colors, min, max } => {
                let last = colors.len().checked_sub(1)?;
                let t = if max > min {
                    ((value - min) / (max - min)).clamp(0.0, 1.0)
                } else {
                    0.5
                };
                colors.get((t * last as f32).round() as usize).copied()
            }
        }
    }

    /// Legend rows, top to bottom.
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        match self {
            ResolvedScale::Bathymetry { land } => land
                .map(|color| LegendEntry {
                    label: "Land".to_string(),
                    color,
                })
                .into_iter()
                .chain((0..BATHYMETRY_BUCKETS).rev().map(|idx| LegendEntry {
                    label: bathymetry_label(idx),
                    color: BATHYMETRY_COLORS[idx],
                }))
                .collect(),
            ResolvedScale::Linear { min, max, .. } => {
                let rows = 5;
                (0..rows)
                    .rev()
                    .filter_map(|k| {
                        let value = min + (max - min) * k as f32 / (rows - 1) as f32;
                        self.color(value).map(|color| LegendEntry {
                            label: format_legend_value(value),
                            color,
                        })
                    })
                    .collect()
            }
        }
    }
}

fn format_legend_value(value: f32) -> String {
    if value.abs() >= 100.0 || value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries_are_upper_inclusive() {
        assert_eq!(bathymetry_bucket(0.0), Some(12));
        assert_eq!(bathymetry_bucket(-29.99), Some(12));
        assert_eq!(bathymetry_bucket(-30.0), Some(11));
        assert_eq!(bathymetry_bucket(-55.0), Some(11));
        assert_eq!(bathymetry_bucket(-3180.0), Some(0));
        assert_eq!(bathymetry_bucket(-3179.9), Some(1));
        assert_eq!(bathymetry_bucket(-11_000.0), Some(0));
    }

    #[test]
    fn test_land_and_nan_have_no_bucket() {
        assert_eq!(bathymetry_bucket(0.5), None);
        assert_eq!(bathymetry_bucket(f32::NAN), None);
    }

    #[test]
    fn test_deepest_bucket_is_darkest() {
        let luminance = |c: Color| c.r as u32 + c.g as u32 + c.b as u32;
        for pair in BATHYMETRY_COLORS.windows(2) {
            assert!(luminance(pair[0]) < luminance(pair[1]));
        }
    }

    #[test]
    fn test_ramp_endpoints() {
        let anchors = DivergingPalette::RdBu.classes();
        let colors = ramp(&anchors, 100);
        assert_eq!(colors.len(), 100);
        assert_eq!(colors[0], anchors[0]);
        assert_eq!(colors[99], anchors[10]);
    }

    #[test]
    fn test_bucket_labels() {
        assert_eq!(bathymetry_label(12), "-30 to 0");
        assert_eq!(bathymetry_label(0), "-3180 and deeper");
    }

    #[test]
    fn test_palette_from_str() {
        assert_eq!("rdylbu".parse::<DivergingPalette>().unwrap(), DivergingPalette::RdYlBu);
        assert!("viridis".parse::<DivergingPalette>().is_err());
    }
}
