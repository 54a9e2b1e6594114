//! Cropping feature sets to a region.

use geo::{BooleanOps, Rect};
use map_common::BoundingRegion;
use projection::CrsTransform;
use tracing::debug;

use crate::error::Result;
use crate::features::{Feature, FeatureGeometry, FeatureSet};

/// Keep the parts of a set inside `region`.
///
/// `region` may be in any supported CRS; it is transformed to the set's CRS
/// first. Points outside are dropped, polygons are intersected with the
/// region and dropped when nothing remains.
pub fn crop(set: &FeatureSet, region: &BoundingRegion) -> Result<FeatureSet> {
    let region = CrsTransform::new(region.crs, set.crs()).transform_region(region)?;
    let window = Rect::new(
        (region.min_x, region.min_y),
        (region.max_x, region.max_y),
    )
    .to_polygon();

    let mut kept = Vec::new();
    for feature in set.iter() {
        let Some((x0, y0, x1, y1)) = feature.geometry.bounds() else {
            continue;
        };
        let inside = region.contains_point(x0, y0) && region.contains_point(x1, y1);
        let disjoint = x1 < region.min_x || x0 > region.max_x || y1 < region.min_y || y0 > region.max_y;

        match &feature.geometry {
            _ if inside => kept.push(feature.clone()),
            _ if disjoint => {}
            FeatureGeometry::Point(_) => {}
            FeatureGeometry::Polygon(mp) => {
                let clipped = mp.intersection(&window);
                if !clipped.0.is_empty() {
                    kept.push(Feature::new(
                        FeatureGeometry::Polygon(clipped),
                        feature.attributes.clone(),
                    ));
                }
            }
        }
    }

    debug!(before = set.len(), after = kept.len(), "Cropped features");
    Ok(FeatureSet::with_features(set.crs(), kept))
}
