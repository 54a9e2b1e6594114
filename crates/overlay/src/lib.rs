//! Vector overlays for field maps.
//!
//! Point tables (nest locations, fishing sites) and polygon shapefiles
//! (coastlines, fishing zones) load into a [`FeatureSet`] that always
//! carries an explicit CRS. Polygons go through [`repair_features`] before
//! they are rendered; sets can be subset by attribute, reprojected and
//! cropped to a region.

pub mod crop;
pub mod error;
pub mod features;
pub mod points;
pub mod repair;
pub mod reproject;
pub mod shp;
pub mod subset;

pub use crop::crop;
pub use error::{OverlayError, Result};
pub use features::{AttributeValue, Attributes, Feature, FeatureGeometry, FeatureSet};
pub use points::{parse_point_table, read_point_table, PointLoad, PointTableOptions, SkippedRow};
pub use repair::{repair_features, repair_geometry, DroppedFeature, RepairReport};
pub use reproject::reproject;
pub use shp::read_shapefile;
pub use subset::{filter_by_attribute, partition_by_attribute, Partition};
