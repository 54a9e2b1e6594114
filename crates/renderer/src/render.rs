//! Composition of a [`MapProduct`] into an RGBA image.
//!
//! Every layer is reconciled to the display CRS before drawing: rasters by
//! inverse-projecting each output pixel, samples and features by forward
//! projection. Drawing is clipped to the plot area framed by the axis
//! limits; tick labels and the legend sit in the margins.

use geo::LineString;
use grid_processor::PointSamples;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use map_common::{BoundingRegion, Color, RasterImage};
use overlay::{repair_features, reproject, FeatureGeometry, FeatureSet};
use projection::CrsTransform;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::colorscale::ResolvedScale;
use crate::config::RenderConfig;
use crate::draw::{blend_pixel, fill_rect, ClipRect, VectorLayer};
use crate::error::{RenderError, Result};
use crate::map::{Layer, MapProduct};
use crate::style::{PointStyle, PolygonStyle};
use crate::text::Labeler;

/// Largest accepted output dimension in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

const TICK_LENGTH: i32 = 5;
const SWATCH: i32 = 14;
const LEGEND_GAP: i32 = 12;
const FRAME_PAD: i32 = 10;

/// Mapping between display coordinates and output pixels.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub limits: BoundingRegion,
    pub plot: ClipRect,
}

impl Viewport {
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let l = &self.limits;
        let px = self.plot.x0 as f64 + (x - l.min_x) / l.width() * self.plot.width() as f64;
        let py = self.plot.y0 as f64 + (l.max_y - y) / l.height() * self.plot.height() as f64;
        (px as f32, py as f32)
    }

    /// Display coordinates at the center of pixel `(px, py)`.
    pub fn to_world(&self, px: i32, py: i32) -> (f64, f64) {
        let l = &self.limits;
        let fx = (px - self.plot.x0) as f64 + 0.5;
        let fy = (py - self.plot.y0) as f64 + 0.5;
        (
            l.min_x + fx / self.plot.width() as f64 * l.width(),
            l.max_y - fy / self.plot.height() as f64 * l.height(),
        )
    }
}

/// Render every layer of `product`, bottom first.
pub fn render(product: &MapProduct, config: &RenderConfig) -> Result<RgbaImage> {
    let display = product.display();
    let (width, height) = (display.width, display.height);
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(RenderError::InvalidSize { width, height });
    }

    let limits = product.limits()?;
    let legend_scale = product
        .layers()
        .iter()
        .rev()
        .find_map(|layer| match layer {
            Layer::RasterFill { samples, scale } => Some(scale.resolve(samples.value_range())),
            _ => None,
        })
        .transpose()?;
    let show_legend = display.legend && legend_scale.is_some();

    let plot = plot_area(width, height, display.axis_labels, show_legend, config)?;
    let view = Viewport { limits, plot };
    let labeler = if display.axis_labels || show_legend {
        Labeler::from_config(config)
    } else {
        None
    };

    info!(
        layers = product.layers().len(),
        crs = %limits.crs,
        width,
        height,
        "Rendering map"
    );

    let mut img = RgbaImage::from_pixel(width, height, Rgba(display.background.to_array()));
    for layer in product.layers() {
        debug!(layer = layer.name(), "Drawing layer");
        match layer {
            Layer::Basemap(raster) => draw_raster(&mut img, raster, &view),
            Layer::RasterFill { samples, scale } => {
                let scale = scale.resolve(samples.value_range())?;
                draw_samples(&mut img, samples, &scale, &view)?;
            }
            Layer::Polygons { features, style } => draw_polygons(&mut img, features, style, &view)?,
            Layer::Points { features, style } => draw_points(&mut img, features, style, &view)?,
        }
    }

    if display.axis_labels {
        draw_axes(&mut img, &view, config, labeler.as_ref());
    }
    if let (true, Some(scale)) = (show_legend, legend_scale.as_ref()) {
        draw_legend(
            &mut img,
            scale,
            display.legend_title.as_deref(),
            &view,
            config,
            labeler.as_ref(),
        );
    }

    Ok(img)
}

fn plot_area(
    width: u32,
    height: u32,
    axis_labels: bool,
    legend: bool,
    config: &RenderConfig,
) -> Result<ClipRect> {
    let (w, h) = (width as i32, height as i32);
    let (left, bottom, pad) = if axis_labels {
        let margin = config.axis_margin as i32;
        (margin, margin / 2, FRAME_PAD)
    } else {
        (0, 0, 0)
    };
    let legend_width = if legend { config.legend_width as i32 } else { 0 };

    let plot = ClipRect::new(left, pad, w - pad - legend_width, h - bottom);
    if plot.width() < 1 || plot.height() < 1 {
        return Err(RenderError::InvalidSize { width, height });
    }
    Ok(plot)
}

fn draw_raster(img: &mut RgbaImage, raster: &RasterImage, view: &Viewport) {
    let to_raster = CrsTransform::new(view.limits.crs, raster.crs());
    let range = raster.value_range();
    let plot = view.plot;

    let rows: Vec<Vec<Option<Color>>> = (plot.y0..plot.y1)
        .into_par_iter()
        .map(|py| {
            (plot.x0..plot.x1)
                .map(|px| {
                    let (x, y) = view.to_world(px, py);
                    let (rx, ry) = to_raster.transform(x, y).ok()?;
                    let (i, j) = raster.grid.cell_index(rx, ry)?;
                    raster_color(raster, i, j, range)
                })
                .collect()
        })
        .collect();

    for (dy, row) in rows.into_iter().enumerate() {
        for (dx, color) in row.into_iter().enumerate() {
            if let Some(color) = color {
                blend_pixel(img, plot.x0 + dx as i32, plot.y0 + dy as i32, color, &plot);
            }
        }
    }
}

/// RGBA cells as stored; scalar cells as grayscale over the value range.
fn raster_color(raster: &RasterImage, i: usize, j: usize, range: Option<(f32, f32)>) -> Option<Color> {
    if let Some([r, g, b, a]) = raster.rgba_at(i, j) {
        return Some(Color::new(r, g, b, a));
    }
    let value = raster.value_at(i, j)?;
    let (lo, hi) = range?;
    let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
    let gray = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(Color::rgb(gray, gray, gray))
}

fn draw_samples(
    img: &mut RgbaImage,
    samples: &PointSamples,
    scale: &ResolvedScale,
    view: &Viewport,
) -> Result<()> {
    let transform = CrsTransform::new(samples.crs, view.limits.crs);
    let (hx, hy) = (samples.cell_size.0 / 2.0, samples.cell_size.1 / 2.0);
    let mut cells = VectorLayer::new(img.width(), img.height(), &view.plot)?.aliased();
    let mut skipped = 0usize;

    for sample in samples.iter() {
        let Some(color) = scale.color(sample.value) else {
            continue;
        };

        if transform.is_identity() {
            let (x0, y0) = view.to_pixel(sample.x - hx, sample.y + hy);
            let (x1, y1) = view.to_pixel(sample.x + hx, sample.y - hy);
            fill_rect(img, x0, y0, x1, y1, color, &view.plot);
            continue;
        }

        let corners = [
            (sample.x - hx, sample.y - hy),
            (sample.x + hx, sample.y - hy),
            (sample.x + hx, sample.y + hy),
            (sample.x - hx, sample.y + hy),
        ];
        let ring: Option<Vec<(f32, f32)>> = corners
            .iter()
            .map(|&(x, y)| transform.transform(x, y).ok().map(|(dx, dy)| view.to_pixel(dx, dy)))
            .collect();
        match ring {
            Some(ring) => cells.fill_rings(&[ring], color),
            None => skipped += 1,
        }
    }
    cells.composite_onto(img);

    if skipped > 0 {
        warn!(skipped, crs = %view.limits.crs, "Samples outside the display projection were not drawn");
    }
    Ok(())
}

fn draw_polygons(
    img: &mut RgbaImage,
    features: &FeatureSet,
    style: &PolygonStyle,
    view: &Viewport,
) -> Result<()> {
    let (repaired, report) = repair_features(features);
    if !report.dropped.is_empty() {
        warn!(dropped = report.dropped.len(), "Irreparable polygons left off the map");
    }
    let projected = reproject(&repaired, view.limits.crs)?;
    let mut layer = VectorLayer::new(img.width(), img.height(), &view.plot)?;

    let to_pixels = |ring: &LineString<f64>| -> Vec<(f32, f32)> {
        ring.coords().map(|c| view.to_pixel(c.x, c.y)).collect()
    };

    for feature in projected.iter() {
        let FeatureGeometry::Polygon(multi) = &feature.geometry else {
            continue;
        };
        for polygon in multi {
            let rings: Vec<Vec<(f32, f32)>> = std::iter::once(polygon.exterior())
                .chain(polygon.interiors().iter())
                .map(to_pixels)
                .collect();
            if let Some(fill) = style.fill {
                layer.fill_rings(&rings, fill);
            }
            if let Some(outline) = style.outline {
                for ring in &rings {
                    layer.stroke(ring, true, outline, style.line_width, style.line_style);
                }
            }
        }
    }
    layer.composite_onto(img);
    Ok(())
}

fn draw_points(img: &mut RgbaImage, features: &FeatureSet, style: &PointStyle, view: &Viewport) -> Result<()> {
    let projected = reproject(features, view.limits.crs)?;
    let mut layer = VectorLayer::new(img.width(), img.height(), &view.plot)?;
    for feature in projected.iter() {
        if let FeatureGeometry::Point(point) = &feature.geometry {
            let (px, py) = view.to_pixel(point.x(), point.y());
            layer.marker(px, py, style.shape, style.size, style.fill, style.outline);
        }
    }
    layer.composite_onto(img);
    Ok(())
}

/// Spacing of "nice" ticks (1, 2 or 5 times a power of ten) for a span.
pub fn tick_step(span: f64, target: usize) -> Option<f64> {
    if !span.is_finite() || span <= 0.0 || target == 0 {
        return None;
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw)
}

/// Tick positions inside `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let Some(step) = tick_step(max - min, target) else {
        return Vec::new();
    };
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn tick_label(value: f64, step: f64) -> String {
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    let value = if value.abs() < step * 1e-9 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}

fn draw_axes(img: &mut RgbaImage, view: &Viewport, config: &RenderConfig, labeler: Option<&Labeler>) {
    let black = Rgba(Color::BLACK.to_array());
    let plot = view.plot;
    let limits = view.limits;

    draw_hollow_rect_mut(
        img,
        Rect::at(plot.x0 - 1, plot.y0 - 1).of_size(plot.width() as u32 + 2, plot.height() as u32 + 2),
        black,
    );

    if let Some(step) = tick_step(limits.width(), config.tick_count) {
        for x in nice_ticks(limits.min_x, limits.max_x, config.tick_count) {
            let px = view.to_pixel(x, limits.min_y).0;
            let base = plot.y1 as f32;
            draw_line_segment_mut(img, (px, base), (px, base + TICK_LENGTH as f32), black);
            if let Some(labeler) = labeler {
                let text = tick_label(x, step);
                let (tw, _) = labeler.measure(&text);
                labeler.draw(img, px as i32 - tw / 2, plot.y1 + TICK_LENGTH + 2, Color::BLACK, &text);
            }
        }
    }

    if let Some(step) = tick_step(limits.height(), config.tick_count) {
        for y in nice_ticks(limits.min_y, limits.max_y, config.tick_count) {
            let py = view.to_pixel(limits.min_x, y).1;
            let base = plot.x0 as f32;
            draw_line_segment_mut(img, (base - TICK_LENGTH as f32, py), (base, py), black);
            if let Some(labeler) = labeler {
                let text = tick_label(y, step);
                let (tw, th) = labeler.measure(&text);
                labeler.draw(
                    img,
                    plot.x0 - TICK_LENGTH - 3 - tw,
                    py as i32 - th / 2,
                    Color::BLACK,
                    &text,
                );
            }
        }
    }
}

fn draw_legend(
    img: &mut RgbaImage,
    scale: &ResolvedScale,
    title: Option<&str>,
    view: &Viewport,
    config: &RenderConfig,
    labeler: Option<&Labeler>,
) {
    let black = Rgba(Color::BLACK.to_array());
    let x0 = view.plot.x1 + LEGEND_GAP;
    let row = (config.font_size.ceil() as i32 + 6).max(SWATCH + 4);
    let mut y = view.plot.y0;

    if let (Some(title), Some(labeler)) = (title, labeler) {
        labeler.draw(img, x0, y, Color::BLACK, title);
        y += row;
    }

    for entry in scale.legend_entries() {
        if y + SWATCH > img.height() as i32 || x0 + SWATCH > img.width() as i32 {
            break;
        }
        let swatch = Rect::at(x0, y).of_size(SWATCH as u32, SWATCH as u32);
        draw_filled_rect_mut(img, swatch, Rgba(entry.color.to_array()));
        draw_hollow_rect_mut(img, swatch, black);
        if let Some(labeler) = labeler {
            labeler.draw(img, x0 + SWATCH + 6, y, Color::BLACK, &entry.label);
        }
        y += row;
    }
}
