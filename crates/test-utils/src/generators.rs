//! Test data generators for synthetic elevation and depth data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use image::{ImageEncoder, RgbImage};

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50); // 10 * 5
/// assert_eq!(grid[0], 0.0);   // col=0, row=0 -> 0*1000 + 0
/// assert_eq!(grid[1], 1000.0); // col=1, row=0 -> 1*1000 + 0
/// assert_eq!(grid[10], 1.0);  // col=0, row=1 -> 0*1000 + 1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates an island-like elevation grid.
///
/// A dome peaking at `peak` meters in the center falls below sea level
/// towards the edges, with a band of near-zero values along the shore.
pub fn create_island_grid(width: usize, height: usize, peak: f32) -> Vec<f32> {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let max_r = cx.min(cy).max(1.0);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let r = ((col as f32 - cx).powi(2) + (row as f32 - cy).powi(2)).sqrt() / max_r;
            // 1 at the center, 0 at r = 0.7, negative beyond
            data.push(peak * (1.0 - r / 0.7));
        }
    }
    data
}

/// Creates a continental-shelf bathymetry grid in meters.
///
/// Depth is 0 along the western column and deepens eastward to
/// `max_depth` (a negative number) on the eastern column.
pub fn create_shelf_bathymetry(width: usize, height: usize, max_depth: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let t = col as f32 / (width.max(2) - 1) as f32;
            data.push(max_depth * t * t);
        }
    }
    data
}

/// Replaces every `nan_every`-th sample with NaN and every
/// `sentinel_every`-th with `sentinel`.
pub fn punch_gaps(data: &mut [f32], nan_every: usize, sentinel_every: usize, sentinel: f32) {
    for (i, v) in data.iter_mut().enumerate() {
        if nan_every > 0 && i % nan_every == 0 {
            *v = f32::NAN;
        } else if sentinel_every > 0 && i % sentinel_every == 0 {
            *v = sentinel;
        }
    }
}

/// Encodes an elevation in meters as a Terrarium RGB triple.
pub fn terrarium_encode(elevation: f32) -> [u8; 3] {
    let v = (elevation as f64 + 32768.0).clamp(0.0, 65535.996);
    let r = (v / 256.0).floor();
    let g = (v - r * 256.0).floor();
    let b = ((v - r * 256.0 - g) * 256.0).floor();
    [r as u8, g as u8, b as u8]
}

/// Builds a PNG-encoded Terrarium tile of `size` x `size` pixels whose
/// elevation at pixel `(x, y)` is `elevation(x, y)`.
pub fn terrarium_tile_png<F>(size: u32, elevation: F) -> Vec<u8>
where
    F: Fn(u32, u32) -> f32,
{
    let img = RgbImage::from_fn(size, size, |x, y| image::Rgb(terrarium_encode(elevation(x, y))));
    encode_png(img.as_raw(), size, size, image::ColorType::Rgb8)
}

/// Builds a PNG image of a single solid RGB color.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb(rgb));
    encode_png(img.as_raw(), width, height, image::ColorType::Rgb8)
}

fn encode_png(raw: &[u8], width: u32, height: u32, color: image::ColorType) -> Vec<u8> {
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(raw, width, height, color)
        .expect("PNG encoding of in-memory test image failed");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_island_has_land_and_sea() {
        let grid = create_island_grid(21, 21, 100.0);
        assert!(grid.iter().any(|v| *v > 50.0));
        assert!(grid.iter().any(|v| *v < 0.0));
    }

    #[test]
    fn test_shelf_monotonic() {
        let grid = create_shelf_bathymetry(10, 2, -3000.0);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[9], -3000.0);
        assert!(grid[..10].windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn test_terrarium_sea_level() {
        assert_eq!(terrarium_encode(0.0), [128, 0, 0]);
        assert_eq!(terrarium_encode(-32768.0), [0, 0, 0]);
    }
}
