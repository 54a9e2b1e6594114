//! Raster flattening and the sea-level clamp.

use map_common::{RasterData, RasterImage};
use rayon::prelude::*;
use tracing::debug;

use crate::config::GridProcessorConfig;
use crate::error::{GridProcessorError, Result};
use crate::points::{PointSample, PointSamples};

/// Flatten a scalar raster into point samples with the default config.
///
/// Missing samples (NaN or the raster's nodata sentinel) are dropped.
pub fn flatten(raster: &RasterImage) -> Result<PointSamples> {
    flatten_with(raster, &GridProcessorConfig::default())
}

/// Flatten a scalar raster, switching to the rayon pool for large grids.
pub fn flatten_with(raster: &RasterImage, config: &GridProcessorConfig) -> Result<PointSamples> {
    let RasterData::Scalar(values) = &raster.data else {
        return Err(GridProcessorError::NotScalar);
    };
    let grid = raster.grid;

    let row_samples = |j: usize| {
        let row = &values[j * grid.nx..(j + 1) * grid.nx];
        row.iter()
            .enumerate()
            .filter(|(_, v)| !raster.is_missing(**v))
            .filter_map(move |(i, v)| {
                grid.cell_center(i, j)
                    .map(|(x, y)| PointSample { x, y, value: *v })
            })
            .collect::<Vec<_>>()
    };

    let samples: Vec<PointSample> = if grid.len() >= config.parallel_threshold {
        (0..grid.ny).into_par_iter().flat_map_iter(row_samples).collect()
    } else {
        (0..grid.ny).flat_map(row_samples).collect()
    };

    debug!(
        cells = grid.len(),
        kept = samples.len(),
        dropped = grid.len() - samples.len(),
        "Flattened raster"
    );

    Ok(PointSamples::new(
        raster.crs(),
        (grid.dx(), grid.dy()),
        samples,
    ))
}

/// Clamp values within `epsilon` of zero to exactly zero.
///
/// Returns a derived copy; applying it twice gives the same result as once.
pub fn clamp_sea_level(samples: &PointSamples, epsilon: f32) -> Result<PointSamples> {
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(GridProcessorError::InvalidEpsilon(epsilon));
    }

    let clamped: Vec<PointSample> = samples
        .samples
        .par_iter()
        .map(|s| {
            if s.value.abs() < epsilon {
                PointSample { value: 0.0, ..*s }
            } else {
                *s
            }
        })
        .collect();

    Ok(PointSamples::new(samples.crs, samples.cell_size, clamped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{BoundingRegion, GridSpec};

    fn raster(values: Vec<f32>, nodata: Option<f32>) -> RasterImage {
        let extent = BoundingRegion::lon_lat(0.0, 0.0, 2.0, 2.0).unwrap();
        RasterImage::scalar(GridSpec::new(2, 2, extent), values, nodata).unwrap()
    }

    #[test]
    fn test_flatten_cell_centers() {
        let samples = flatten(&raster(vec![1.0, 2.0, 3.0, 4.0], None)).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples.samples[0], PointSample { x: 0.5, y: 1.5, value: 1.0 });
        assert_eq!(samples.samples[3], PointSample { x: 1.5, y: 0.5, value: 4.0 });
    }

    #[test]
    fn test_flatten_drops_missing() {
        let samples = flatten(&raster(vec![f32::NAN, -32768.0, 0.05, 7.0], Some(-32768.0))).unwrap();
        assert_eq!(samples.len(), 2);
        assert!(samples.iter().all(|s| s.value.is_finite()));
    }

    #[test]
    fn test_flatten_rgba_rejected() {
        let extent = BoundingRegion::lon_lat(0.0, 0.0, 1.0, 1.0).unwrap();
        let rgba = RasterImage::rgba(GridSpec::new(1, 1, extent), vec![0, 0, 0, 255]).unwrap();
        assert!(matches!(flatten(&rgba), Err(GridProcessorError::NotScalar)));
    }

    #[test]
    fn test_clamp_threshold_is_strict() {
        let samples = flatten(&raster(vec![0.05, -0.099, 0.1, -0.2], None)).unwrap();
        let clamped = clamp_sea_level(&samples, 0.1).unwrap();
        let values: Vec<f32> = clamped.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.0, 0.0, 0.1, -0.2]);
    }

    #[test]
    fn test_clamp_rejects_negative_epsilon() {
        let samples = flatten(&raster(vec![0.0; 4], None)).unwrap();
        assert!(clamp_sea_level(&samples, -0.1).is_err());
        assert!(clamp_sea_level(&samples, f32::NAN).is_err());
    }
}
