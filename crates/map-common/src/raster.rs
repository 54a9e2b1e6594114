//! Georeferenced raster images.

use crate::bbox::BoundingRegion;
use crate::crs::CrsCode;
use crate::error::{MapError, MapResult};
use crate::grid::GridSpec;

/// Pixel payload of a raster.
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    /// RGBA image samples, 4 bytes per cell
    Rgba(Vec<u8>),
    /// Scalar values (elevation or depth in meters)
    Scalar(Vec<f32>),
}

/// A 2-D grid of samples with a spatial extent and CRS.
///
/// Rasters are never mutated in place; transforms return derived copies.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub grid: GridSpec,
    pub data: RasterData,
    /// Missing-data sentinel for scalar rasters. NaN is always missing.
    pub nodata: Option<f32>,
}

impl RasterImage {
    /// Create a scalar raster, checking the sample count.
    pub fn scalar(grid: GridSpec, values: Vec<f32>, nodata: Option<f32>) -> MapResult<Self> {
        check_len(&grid, values.len(), 1)?;
        Ok(Self {
            grid,
            data: RasterData::Scalar(values),
            nodata,
        })
    }

    /// Create an RGBA raster, checking the byte count.
    pub fn rgba(grid: GridSpec, pixels: Vec<u8>) -> MapResult<Self> {
        check_len(&grid, pixels.len(), 4)?;
        Ok(Self {
            grid,
            data: RasterData::Rgba(pixels),
            nodata: None,
        })
    }

    pub fn width(&self) -> usize {
        self.grid.nx
    }

    pub fn height(&self) -> usize {
        self.grid.ny
    }

    pub fn extent(&self) -> BoundingRegion {
        self.grid.extent
    }

    pub fn crs(&self) -> CrsCode {
        self.grid.crs()
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.data, RasterData::Scalar(_))
    }

    /// Whether a scalar sample counts as missing data.
    pub fn is_missing(&self, value: f32) -> bool {
        value.is_nan() || self.nodata.map_or(false, |nd| value == nd)
    }

    /// Scalar value at a cell, `None` when missing or not a scalar raster.
    pub fn value_at(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.grid.nx || j >= self.grid.ny {
            return None;
        }
        match &self.data {
            RasterData::Scalar(values) => {
                let v = values[self.grid.flat_index(i, j)];
                (!self.is_missing(v)).then_some(v)
            }
            RasterData::Rgba(_) => None,
        }
    }

    /// RGBA color at a cell, `None` for scalar rasters.
    pub fn rgba_at(&self, i: usize, j: usize) -> Option<[u8; 4]> {
        if i >= self.grid.nx || j >= self.grid.ny {
            return None;
        }
        match &self.data {
            RasterData::Rgba(pixels) => {
                let idx = self.grid.flat_index(i, j) * 4;
                Some([pixels[idx], pixels[idx + 1], pixels[idx + 2], pixels[idx + 3]])
            }
            RasterData::Scalar(_) => None,
        }
    }

    /// Min and max of the valid scalar values.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let RasterData::Scalar(values) = &self.data else {
            return None;
        };
        values
            .iter()
            .copied()
            .filter(|v| !self.is_missing(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Derived raster holding only the cells that intersect `region`.
    ///
    /// `region` must be in the raster's CRS.
    pub fn crop(&self, region: &BoundingRegion) -> MapResult<RasterImage> {
        let window = self.grid.window(region).ok_or_else(|| MapError::NoOverlap {
            requested: format!("{:?}", region),
            extent: format!("{:?}", self.grid.extent),
        })?;
        let (i0, j0, i1, j1) = window;
        let sub = self.grid.sub_grid(window)?;

        let data = match &self.data {
            RasterData::Scalar(values) => {
                let mut out = Vec::with_capacity(sub.len());
                for j in j0..j1 {
                    let row = self.grid.flat_index(i0, j);
                    out.extend_from_slice(&values[row..row + (i1 - i0)]);
                }
                RasterData::Scalar(out)
            }
            RasterData::Rgba(pixels) => {
                let mut out = Vec::with_capacity(sub.len() * 4);
                for j in j0..j1 {
                    let row = self.grid.flat_index(i0, j) * 4;
                    out.extend_from_slice(&pixels[row..row + (i1 - i0) * 4]);
                }
                RasterData::Rgba(out)
            }
        };

        Ok(RasterImage {
            grid: sub,
            data,
            nodata: self.nodata,
        })
    }
}

fn check_len(grid: &GridSpec, actual: usize, per_cell: usize) -> MapResult<()> {
    if grid.is_empty() {
        return Err(MapError::EmptyRaster);
    }
    let expected = grid.len() * per_cell;
    if actual != expected {
        return Err(MapError::RasterSizeMismatch {
            width: grid.nx,
            height: grid.ny,
            expected,
            actual,
        });
    }
    Ok(())
}
