//! Shapefile loading.
//!
//! The CRS is resolved before any shape is read: the `.prj` sidecar wins,
//! then the caller's assignment. A file with neither is rejected.

use std::path::Path;

use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use map_common::CrsCode;
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use tracing::{debug, info, warn};

use crate::error::{OverlayError, Result};
use crate::features::{AttributeValue, Attributes, Feature, FeatureGeometry, FeatureSet};

/// Read a `.shp`/`.dbf` pair into a feature set.
///
/// Polygons become multipolygons, each outer ring followed by its holes.
/// Point and multipoint shapes become point features. Polylines have no
/// overlay representation and are skipped.
pub fn read_shapefile(path: impl AsRef<Path>, assign: Option<CrsCode>) -> Result<FeatureSet> {
    let path = path.as_ref();
    let crs = resolve_crs(path, assign)?;

    let mut reader = shapefile::Reader::from_path(path)?;
    let mut features = FeatureSet::new(crs);
    let mut skipped = 0usize;

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let attributes = record_attributes(record);

        let geometries: Vec<FeatureGeometry> = match shape {
            Shape::Polygon(p) => vec![polygon_geometry(p.rings(), |pt| (pt.x, pt.y))],
            Shape::PolygonM(p) => vec![polygon_geometry(p.rings(), |pt| (pt.x, pt.y))],
            Shape::PolygonZ(p) => vec![polygon_geometry(p.rings(), |pt| (pt.x, pt.y))],
            Shape::Point(p) => vec![FeatureGeometry::Point(Point::new(p.x, p.y))],
            Shape::PointM(p) => vec![FeatureGeometry::Point(Point::new(p.x, p.y))],
            Shape::PointZ(p) => vec![FeatureGeometry::Point(Point::new(p.x, p.y))],
            Shape::Multipoint(mp) => mp
                .points()
                .iter()
                .map(|p| FeatureGeometry::Point(Point::new(p.x, p.y)))
                .collect(),
            Shape::NullShape => Vec::new(),
            other => {
                debug!(shape = ?other.shapetype(), "Skipping unsupported shape");
                skipped += 1;
                Vec::new()
            }
        };

        for geometry in geometries {
            features.push(Feature::new(geometry, attributes.clone()));
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "Shapes without an overlay representation were skipped");
    }
    info!(
        path = %path.display(),
        features = features.len(),
        crs = %crs,
        "Loaded shapefile"
    );
    Ok(features)
}

fn resolve_crs(path: &Path, assign: Option<CrsCode>) -> Result<CrsCode> {
    let prj = path.with_extension("prj");
    if prj.exists() {
        let wkt = std::fs::read_to_string(&prj)?;
        let detected = CrsCode::from_prj_wkt(&wkt)?;
        if let Some(assigned) = assign.filter(|a| *a != detected) {
            warn!(
                path = %path.display(),
                prj = %detected,
                assigned = %assigned,
                "Assigned CRS differs from .prj; using .prj"
            );
        }
        return Ok(detected);
    }
    assign.ok_or_else(|| OverlayError::MissingCrs(path.to_path_buf()))
}

fn polygon_geometry<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64)) -> FeatureGeometry {
    let to_line = |points: &[P]| {
        LineString::new(
            points
                .iter()
                .map(|p| {
                    let (x, y) = xy(p);
                    Coord { x, y }
                })
                .collect(),
        )
    };

    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => polygons.push((to_line(points.as_slice()), Vec::new())),
            PolygonRing::Inner(points) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(to_line(points.as_slice())),
                // A hole before any outer ring is kept as an outer ring
                None => polygons.push((to_line(points.as_slice()), Vec::new())),
            },
        }
    }

    FeatureGeometry::Polygon(MultiPolygon::new(
        polygons
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    ))
}

fn record_attributes(record: Record) -> Attributes {
    record
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                FieldValue::Character(Some(s)) => AttributeValue::from_text(&s),
                FieldValue::Memo(s) => AttributeValue::from_text(&s),
                FieldValue::Numeric(Some(n)) => AttributeValue::Number(n),
                FieldValue::Float(Some(f)) => AttributeValue::Number(f as f64),
                FieldValue::Integer(i) => AttributeValue::Number(i as f64),
                FieldValue::Double(d) => AttributeValue::Number(d),
                FieldValue::Currency(c) => AttributeValue::Number(c),
                FieldValue::Logical(Some(b)) => AttributeValue::Text(b.to_string()),
                _ => AttributeValue::Null,
            };
            (name, value)
        })
        .collect()
}
