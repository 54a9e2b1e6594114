//! Reprojection of feature sets.

use geo::{Coord, MapCoords};
use map_common::CrsCode;
use projection::{CrsTransform, ProjectionError};
use tracing::debug;

use crate::error::Result;
use crate::features::{Feature, FeatureGeometry, FeatureSet};

/// Reproject every feature to `target`.
///
/// A set already in `target` is returned unchanged. Geographic systems
/// share a datum here, so relabelling between them leaves coordinates as is.
pub fn reproject(set: &FeatureSet, target: CrsCode) -> Result<FeatureSet> {
    if set.crs() == target {
        return Ok(set.clone());
    }

    let transform = CrsTransform::new(set.crs(), target);
    if transform.is_identity() {
        return Ok(FeatureSet::with_features(target, set.features().to_vec()));
    }

    let project = |c: Coord<f64>| -> std::result::Result<Coord<f64>, ProjectionError> {
        let (x, y) = transform.transform(c.x, c.y)?;
        Ok(Coord { x, y })
    };

    let features = set
        .iter()
        .map(|feature| {
            let geometry = match &feature.geometry {
                FeatureGeometry::Point(p) => FeatureGeometry::Point(p.try_map_coords(project)?),
                FeatureGeometry::Polygon(mp) => FeatureGeometry::Polygon(mp.try_map_coords(project)?),
            };
            Ok(Feature::new(geometry, feature.attributes.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(from = %set.crs(), to = %target, features = features.len(), "Reprojected features");
    Ok(FeatureSet::with_features(target, features))
}
