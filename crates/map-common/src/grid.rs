//! Regular grid georeferencing.

use crate::bbox::BoundingRegion;
use crate::crs::CrsCode;
use crate::error::{MapError, MapResult};
use serde::{Deserialize, Serialize};

/// A regular grid of `nx` by `ny` cells covering `extent`.
///
/// `extent` is the outer edge of the outer cells. Row 0 is the northern
/// (max y) edge and columns increase eastward, matching image scan order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of cells in X (longitude/easting) direction
    pub nx: usize,
    /// Number of cells in Y (latitude/northing) direction
    pub ny: usize,
    /// Outer edges of the grid
    pub extent: BoundingRegion,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(nx: usize, ny: usize, extent: BoundingRegion) -> Self {
        Self { nx, ny, extent }
    }

    /// Build a grid from the coordinates of its outer cell centers.
    ///
    /// Grid services often report cell centers; the extent is widened by
    /// half a cell on every side.
    pub fn from_cell_centers(
        nx: usize,
        ny: usize,
        (first_x, first_y): (f64, f64),
        (last_x, last_y): (f64, f64),
        crs: CrsCode,
    ) -> MapResult<Self> {
        if nx < 2 || ny < 2 {
            return Err(MapError::EmptyRaster);
        }
        let dx = (last_x - first_x).abs() / (nx - 1) as f64;
        let dy = (last_y - first_y).abs() / (ny - 1) as f64;
        let extent = BoundingRegion::new(
            first_x.min(last_x) - dx / 2.0,
            first_y.min(last_y) - dy / 2.0,
            first_x.max(last_x) + dx / 2.0,
            first_y.max(last_y) + dy / 2.0,
            crs,
        )?;
        Ok(Self { nx, ny, extent })
    }

    /// Cell size in X.
    pub fn dx(&self) -> f64 {
        self.extent.width() / self.nx as f64
    }

    /// Cell size in Y.
    pub fn dy(&self) -> f64 {
        self.extent.height() / self.ny as f64
    }

    pub fn crs(&self) -> CrsCode {
        self.extent.crs
    }

    /// Center coordinates of cell `(i, j)`.
    pub fn cell_center(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        if i >= self.nx || j >= self.ny {
            return None;
        }
        Some((
            self.extent.min_x + (i as f64 + 0.5) * self.dx(),
            self.extent.max_y - (j as f64 + 0.5) * self.dy(),
        ))
    }

    /// Cell containing `(x, y)`, if any.
    pub fn cell_index(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !self.extent.contains_point(x, y) {
            return None;
        }
        let i = ((x - self.extent.min_x) / self.dx()).floor() as usize;
        let j = ((self.extent.max_y - y) / self.dy()).floor() as usize;
        // Points on the max edge belong to the last cell
        Some((i.min(self.nx - 1), j.min(self.ny - 1)))
    }

    /// Get the 1D array index for a 2D grid position.
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// Inclusive-exclusive cell window `(i0, j0, i1, j1)` of the cells that
    /// intersect `region`.
    pub fn window(&self, region: &BoundingRegion) -> Option<(usize, usize, usize, usize)> {
        let overlap = self.extent.intersection(region)?;
        let dx = self.dx();
        let dy = self.dy();

        let i0 = ((overlap.min_x - self.extent.min_x) / dx).floor().max(0.0) as usize;
        let i1 = ((overlap.max_x - self.extent.min_x) / dx).ceil() as usize;
        let j0 = ((self.extent.max_y - overlap.max_y) / dy).floor().max(0.0) as usize;
        let j1 = ((self.extent.max_y - overlap.min_y) / dy).ceil() as usize;

        let i1 = i1.min(self.nx).max(i0 + 1);
        let j1 = j1.min(self.ny).max(j0 + 1);
        Some((i0, j0, i1, j1))
    }

    /// Grid restricted to a cell window.
    pub fn sub_grid(&self, (i0, j0, i1, j1): (usize, usize, usize, usize)) -> MapResult<Self> {
        let dx = self.dx();
        let dy = self.dy();
        let extent = BoundingRegion::new(
            self.extent.min_x + i0 as f64 * dx,
            self.extent.max_y - j1 as f64 * dy,
            self.extent.min_x + i1 as f64 * dx,
            self.extent.max_y - j0 as f64 * dy,
            self.extent.crs,
        )?;
        Ok(Self::new(i1 - i0, j1 - j0, extent))
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.nx == 0 || self.ny == 0
    }
}
