//! Drawing primitives.
//!
//! Raster cells are blended pixel by pixel; vector shapes go through a
//! tiny-skia [`VectorLayer`]. Nothing is drawn outside the given
//! [`ClipRect`]. Coordinates are in pixel space with the origin at the
//! top-left corner.

use image::RgbaImage;
use map_common::Color;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Mask, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, StrokeDash,
    Transform,
};

use crate::error::{RenderError, Result};
use crate::style::{LineStyle, MarkerShape};

/// Half-open pixel rectangle `[x0, x1) x [y0, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ClipRect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn of_image(img: &RgbaImage) -> Self {
        Self::new(0, 0, img.width() as i32, img.height() as i32)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// Composite `color` over the pixel at `(x, y)`.
pub fn blend_pixel(img: &mut RgbaImage, x: i32, y: i32, color: Color, clip: &ClipRect) {
    if color.a == 0 || !clip.contains(x, y) || x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= img.width() || y >= img.height() {
        return;
    }

    let dst = img.get_pixel_mut(x, y);
    if color.a == 255 {
        dst.0 = color.to_array();
        return;
    }

    let sa = color.a as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
    };
    dst.0 = [
        mix(color.r, dst.0[0]),
        mix(color.g, dst.0[1]),
        mix(color.b, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ];
}

/// Fill the pixels whose centers fall in `[x0, x1) x [y0, y1)`.
pub fn fill_rect(img: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Color, clip: &ClipRect) {
    let (x0, x1) = (x0.min(x1), x0.max(x1));
    let (y0, y1) = (y0.min(y1), y0.max(y1));
    let first_col = ((x0 - 0.5).ceil() as i32).max(clip.x0);
    let last_col = ((x1 - 0.5).ceil() as i32).min(clip.x1);
    let first_row = ((y0 - 0.5).ceil() as i32).max(clip.y0);
    let last_row = ((y1 - 0.5).ceil() as i32).min(clip.y1);

    for py in first_row..last_row {
        for px in first_col..last_col {
            blend_pixel(img, px, py, color, clip);
        }
    }
}

/// Vector shapes rasterized with tiny-skia, then composited onto a canvas.
///
/// Paths are drawn into a transparent pixmap the size of the canvas and
/// masked to the clip rectangle, so nothing lands outside the plot area.
pub struct VectorLayer {
    pixmap: Pixmap,
    mask: Mask,
    anti_alias: bool,
}

impl VectorLayer {
    pub fn new(width: u32, height: u32, clip: &ClipRect) -> Result<Self> {
        let invalid = || RenderError::InvalidSize { width, height };
        let mut pixmap = Pixmap::new(width, height).ok_or_else(invalid)?;
        pixmap.fill(tiny_skia::Color::TRANSPARENT);

        let mut mask = Mask::new(width, height).ok_or_else(invalid)?;
        let bounds = Rect::from_ltrb(clip.x0 as f32, clip.y0 as f32, clip.x1 as f32, clip.y1 as f32)
            .ok_or_else(invalid)?;
        mask.fill_path(
            &PathBuilder::from_rect(bounds),
            FillRule::Winding,
            false,
            Transform::identity(),
        );

        Ok(Self {
            pixmap,
            mask,
            anti_alias: true,
        })
    }

    /// Layer for shapes that tile the plane, where smoothed edges would
    /// leave seams between neighbours.
    pub fn aliased(mut self) -> Self {
        self.anti_alias = false;
        self
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = self.anti_alias;
        paint
    }

    /// Even-odd fill of one or more rings; holes are additional rings.
    pub fn fill_rings(&mut self, rings: &[Vec<(f32, f32)>], color: Color) {
        let Some(path) = rings_path(rings) else {
            return;
        };
        let paint = self.paint(color);
        self.pixmap
            .fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), Some(&self.mask));
    }

    /// Stroke a polyline, closing it when `closed` is set.
    pub fn stroke(&mut self, points: &[(f32, f32)], closed: bool, color: Color, width: f32, style: LineStyle) {
        let Some(path) = polyline_path(points, closed) else {
            return;
        };
        let mut stroke = Stroke {
            width: width.max(0.5),
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        match style.pattern(width) {
            Some((on, off)) => stroke.dash = StrokeDash::new(vec![on, off], 0.0),
            None => stroke.line_cap = LineCap::Round,
        }
        let paint = self.paint(color);
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), Some(&self.mask));
    }

    /// Filled and/or outlined marker centered on `(cx, cy)`.
    pub fn marker(
        &mut self,
        cx: f32,
        cy: f32,
        shape: MarkerShape,
        size: f32,
        fill: Option<Color>,
        outline: Option<Color>,
    ) {
        let Some(path) = marker_path(shape, cx, cy, size) else {
            return;
        };
        if let Some(color) = fill {
            let paint = self.paint(color);
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), Some(&self.mask));
        }
        if let Some(color) = outline {
            let stroke = Stroke {
                width: 1.0,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            let paint = self.paint(color);
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), Some(&self.mask));
        }
    }

    /// Blend every painted pixel over `img`.
    pub fn composite_onto(&self, img: &mut RgbaImage) {
        let clip = ClipRect::of_image(img);
        let width = self.pixmap.width() as usize;
        for (idx, pixel) in self.pixmap.pixels().iter().enumerate() {
            if pixel.alpha() == 0 {
                continue;
            }
            let c = pixel.demultiply();
            let (x, y) = ((idx % width) as i32, (idx / width) as i32);
            blend_pixel(img, x, y, Color::new(c.red(), c.green(), c.blue(), c.alpha()), &clip);
        }
    }
}

fn rings_path(rings: &[Vec<(f32, f32)>]) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for ring in rings.iter().filter(|ring| ring.len() >= 3) {
        if ring.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            continue;
        }
        pb.move_to(ring[0].0, ring[0].1);
        for &(x, y) in &ring[1..] {
            pb.line_to(x, y);
        }
        pb.close();
    }
    pb.finish()
}

fn polyline_path(points: &[(f32, f32)], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() || points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.0, first.1);
    for &(x, y) in rest {
        pb.line_to(x, y);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// Path of a marker centered on `(cx, cy)` with `size` as its diameter.
pub fn marker_path(shape: MarkerShape, cx: f32, cy: f32, size: f32) -> Option<Path> {
    let r = size / 2.0;
    let corners = match shape {
        MarkerShape::Circle => return PathBuilder::from_circle(cx, cy, r),
        MarkerShape::Square => {
            return Rect::from_ltrb(cx - r, cy - r, cx + r, cy + r).map(PathBuilder::from_rect)
        }
        MarkerShape::Triangle => {
            let h = r * 3f32.sqrt() / 2.0;
            vec![(cx, cy - r), (cx + h, cy + r / 2.0), (cx - h, cy + r / 2.0)]
        }
        MarkerShape::Diamond => vec![(cx, cy - r), (cx + r, cy), (cx, cy + r), (cx - r, cy)],
    };
    polyline_path(&corners, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(20, 20, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn test_fill_rect_covers_centers() {
        let mut img = canvas();
        let clip = ClipRect::of_image(&img);
        fill_rect(&mut img, 2.0, 2.0, 5.0, 4.0, Color::BLACK, &clip);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(4, 3).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 3).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(2, 4).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_fill_rings_respects_hole() {
        let mut img = canvas();
        let clip = ClipRect::of_image(&img);
        let mut layer = VectorLayer::new(20, 20, &clip).unwrap();
        let outer = vec![(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)];
        let hole = vec![(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)];
        layer.fill_rings(&[outer, hole], Color::BLACK);
        layer.composite_onto(&mut img);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_layer_masked_to_clip() {
        let mut img = canvas();
        let clip = ClipRect::new(5, 5, 10, 10);
        let mut layer = VectorLayer::new(20, 20, &clip).unwrap();
        layer.fill_rings(&[vec![(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)]], Color::BLACK);
        layer.composite_onto(&mut img);
        assert_eq!(img.get_pixel(4, 4).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(7, 7).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(12, 12).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_marker_fills_center() {
        let mut img = canvas();
        let clip = ClipRect::of_image(&img);
        let mut layer = VectorLayer::new(20, 20, &clip).unwrap();
        let red = Color::rgb(255, 0, 0);
        layer.marker(10.0, 10.0, MarkerShape::Diamond, 10.0, Some(red), Some(Color::BLACK));
        layer.composite_onto(&mut img);
        assert_eq!(img.get_pixel(10, 10).0, red.to_array());
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert!(marker_path(MarkerShape::Circle, 5.0, 5.0, 0.0).is_none());
    }

    #[test]
    fn test_clip_blocks_outside_pixels() {
        let mut img = canvas();
        let clip = ClipRect::new(5, 5, 10, 10);
        fill_rect(&mut img, 0.0, 0.0, 20.0, 20.0, Color::BLACK, &clip);
        assert_eq!(img.get_pixel(4, 4).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(5, 5).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_half_alpha_blend() {
        let mut img = canvas();
        let clip = ClipRect::of_image(&img);
        blend_pixel(&mut img, 0, 0, Color::new(0, 0, 0, 128), &clip);
        let p = img.get_pixel(0, 0).0;
        assert!(p[0] > 120 && p[0] < 135);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_dashed_line_has_gaps() {
        let mut img = canvas();
        let clip = ClipRect::of_image(&img);
        let mut layer = VectorLayer::new(20, 20, &clip).unwrap().aliased();
        layer.stroke(&[(0.0, 10.5), (20.0, 10.5)], false, Color::BLACK, 1.0, LineStyle::Dashed);
        layer.composite_onto(&mut img);
        let row: Vec<bool> = (0..20).map(|x| img.get_pixel(x, 10).0[0] == 0).collect();
        assert!(row[0..4].iter().all(|&on| on));
        assert!(row[4..7].iter().all(|&on| !on));
    }

    #[test]
    fn test_solid_ring_closes() {
        let mut img = canvas();
        let clip = ClipRect::of_image(&img);
        let mut layer = VectorLayer::new(20, 20, &clip).unwrap().aliased();
        let ring = [(2.5, 2.5), (17.5, 2.5), (17.5, 17.5), (2.5, 17.5)];
        layer.stroke(&ring, true, Color::BLACK, 1.0, LineStyle::Solid);
        layer.composite_onto(&mut img);
        // Closing edge back to the first vertex
        assert_eq!(img.get_pixel(2, 10).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
    }
}
