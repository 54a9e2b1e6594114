//! Flat point-sample tables derived from rasters.

use map_common::{BoundingRegion, CrsCode};

/// One raster cell as an `(x, y, value)` row at the cell center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub x: f64,
    pub y: f64,
    pub value: f32,
}

/// An unordered collection of samples sharing one CRS.
///
/// `cell_size` keeps the source raster's cell dimensions so renderers can
/// draw each sample as a filled cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSamples {
    pub crs: CrsCode,
    pub cell_size: (f64, f64),
    pub samples: Vec<PointSample>,
}

impl PointSamples {
    pub fn new(crs: CrsCode, cell_size: (f64, f64), samples: Vec<PointSample>) -> Self {
        Self {
            crs,
            cell_size,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PointSample> {
        self.samples.iter()
    }

    /// Min and max sample value.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.samples.iter().fold(None, |acc, s| match acc {
            None => Some((s.value, s.value)),
            Some((lo, hi)) => Some((lo.min(s.value), hi.max(s.value))),
        })
    }

    /// Region covered by the sample cells.
    pub fn extent(&self) -> Option<BoundingRegion> {
        let (hx, hy) = (self.cell_size.0 / 2.0, self.cell_size.1 / 2.0);
        let corners = self
            .samples
            .iter()
            .flat_map(|s| [(s.x - hx, s.y - hy), (s.x + hx, s.y + hy)]);
        BoundingRegion::from_points(corners, self.crs).ok()
    }
}
