//! Polygon validity repair.
//!
//! Valid geometries pass through untouched. Invalid ones are cleaned ring
//! by ring (non-finite coordinates rejected, consecutive duplicates removed,
//! rings closed) and then rebuilt through the even-odd boolean overlay, which
//! splits crossing rings into simple parts and merges overlapping parts.
//! Rings the overlay leaves touching themselves at a vertex are split into
//! separate loops. A result that still fails validation is irreparable.
//!
//! Every successful repair yields a valid geometry, so repairing twice is the
//! same as repairing once.

use geo::{
    Area, BooleanOps, Contains, Coord, InteriorPoint, LineString, MultiPolygon, Polygon, Validation,
};
use tracing::{info, warn};

use crate::features::{Attributes, Feature, FeatureGeometry, FeatureSet};

/// A feature excluded from the repaired set.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFeature {
    /// Position in the input set.
    pub index: usize,
    pub reason: String,
    pub attributes: Attributes,
}

/// What repair did to a feature set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    /// Input positions of features whose geometry changed.
    pub repaired: Vec<usize>,
    pub dropped: Vec<DroppedFeature>,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.repaired.is_empty() && self.dropped.is_empty()
    }
}

/// Repair a polygon geometry. `None` when no valid geometry can be made.
pub fn repair_geometry(geometry: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    if geometry.is_valid() {
        return Some(geometry.clone());
    }

    // Each part goes in as its own operand so its rings are read even-odd,
    // while overlaps between parts are merged by the union itself.
    let merged = geometry
        .iter()
        .filter_map(clean_polygon)
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| {
            acc.union(&MultiPolygon::new(vec![polygon]))
        });

    let parts: Vec<Polygon<f64>> = merged
        .into_iter()
        .flat_map(|polygon| {
            if polygon.is_valid() {
                vec![polygon]
            } else {
                split_touching(&polygon)
            }
        })
        .collect();
    let repaired = MultiPolygon::new(parts);
    (!repaired.0.is_empty() && repaired.is_valid()).then_some(repaired)
}

/// Repair every polygon feature of a set.
///
/// Points with non-finite coordinates and irreparable polygons are left
/// out and listed in the report; the map still renders without them.
pub fn repair_features(set: &FeatureSet) -> (FeatureSet, RepairReport) {
    let mut report = RepairReport::default();
    let mut kept = Vec::with_capacity(set.len());

    for (index, feature) in set.iter().enumerate() {
        let outcome = match &feature.geometry {
            FeatureGeometry::Point(p) if p.x().is_finite() && p.y().is_finite() => {
                Ok(feature.clone())
            }
            FeatureGeometry::Point(_) => Err("non-finite point coordinates"),
            FeatureGeometry::Polygon(mp) => match repair_geometry(mp) {
                Some(repaired) => {
                    if &repaired != mp {
                        report.repaired.push(index);
                    }
                    Ok(Feature::new(
                        FeatureGeometry::Polygon(repaired),
                        feature.attributes.clone(),
                    ))
                }
                None => Err("polygon could not be made valid"),
            },
        };

        match outcome {
            Ok(feature) => kept.push(feature),
            Err(reason) => {
                warn!(index, reason, attributes = ?feature.attributes, "Dropping feature");
                report.dropped.push(DroppedFeature {
                    index,
                    reason: reason.to_string(),
                    attributes: feature.attributes.clone(),
                });
            }
        }
    }

    if !report.is_clean() {
        info!(
            repaired = report.repaired.len(),
            dropped = report.dropped.len(),
            kept = kept.len(),
            "Repaired feature set"
        );
    }
    (FeatureSet::with_features(set.crs(), kept), report)
}

fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = clean_ring(polygon.exterior())?;
    let interiors = polygon.interiors().iter().filter_map(clean_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

fn clean_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return None;
    }

    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
    for c in ring.coords() {
        if coords.last() != Some(c) {
            coords.push(*c);
        }
    }
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    // Closed ring with three distinct corners. Zero net area is left to the
    // overlay: a crossing ring can have lobes that cancel out.
    (coords.len() >= 4).then(|| LineString::new(coords))
}

/// Split rings that revisit a vertex into simple loops.
///
/// Loops are rebuilt largest first; a loop inside an earlier one becomes
/// its hole, anything else a separate polygon.
fn split_touching(polygon: &Polygon<f64>) -> Vec<Polygon<f64>> {
    let mut loops: Vec<LineString<f64>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .flat_map(split_ring)
        .collect();
    loops.sort_by(|a, b| ring_area(b).total_cmp(&ring_area(a)));

    let mut shells: Vec<(Polygon<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in loops {
        let inside = Polygon::new(ring.clone(), Vec::new()).interior_point();
        let owner = match inside {
            Some(p) => shells.iter_mut().find(|(shell, _)| shell.contains(&p)),
            None => None,
        };
        match owner {
            Some((_, holes)) => holes.push(ring),
            None => shells.push((Polygon::new(ring, Vec::new()), Vec::new())),
        }
    }

    shells
        .into_iter()
        .map(|(shell, holes)| Polygon::new(shell.exterior().clone(), holes))
        .collect()
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), Vec::new()).unsigned_area()
}

/// Cut a closed ring into loops at every repeated vertex.
fn split_ring(ring: &LineString<f64>) -> Vec<LineString<f64>> {
    let open = match ring.0.split_last() {
        Some((last, rest)) if rest.first() == Some(last) => rest,
        _ => &ring.0[..],
    };

    let mut loops = Vec::new();
    let mut path: Vec<Coord<f64>> = Vec::with_capacity(open.len() + 1);
    for c in open {
        if let Some(pos) = path.iter().position(|p| p == c) {
            let mut closed = path.split_off(pos);
            closed.push(*c);
            if closed.len() >= 4 {
                loops.push(LineString::new(closed));
            }
        }
        path.push(*c);
    }
    if let Some(first) = path.first().copied() {
        path.push(first);
        if path.len() >= 4 {
            loops.push(LineString::new(path));
        }
    }
    loops
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]
    }

    #[test]
    fn test_valid_input_unchanged() {
        let mp = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);
        assert_eq!(repair_geometry(&mp), Some(mp));
    }

    #[test]
    fn test_overlapping_parts_merged() {
        let mp = MultiPolygon::new(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)]);
        assert!(!mp.is_valid());
        let repaired = repair_geometry(&mp).unwrap();
        assert!(repaired.is_valid());
        assert_eq!(repaired.0.len(), 1);
        assert!((repaired.unsigned_area() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_bowtie_split_into_lobes() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 2.0), (x: 2.0, y: 0.0), (x: 0.0, y: 2.0)];
        let mp = MultiPolygon::new(vec![bowtie]);
        assert!(!mp.is_valid());

        let repaired = repair_geometry(&mp).unwrap();
        assert!(repaired.is_valid());
        assert!((repaired.unsigned_area() - 2.0).abs() < 1e-9);
        assert_eq!(repair_geometry(&repaired), Some(repaired));
    }

    #[test]
    fn test_uneven_bowtie_keeps_both_lobes() {
        let bowtie = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 2.0), (x: 4.0, y: 0.0), (x: 0.0, y: 2.0)];
        let repaired = repair_geometry(&MultiPolygon::new(vec![bowtie])).unwrap();
        assert!(repaired.is_valid());
        assert!((repaired.unsigned_area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_split_ring_at_repeated_vertex() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (2.0, 1.0),
            (4.0, 0.0),
            (4.0, 2.0),
            (2.0, 1.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]);
        let loops = split_ring(&ring);
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(|l| l.0.len() == 4 && l.0.first() == l.0.last()));

        let parts = split_touching(&Polygon::new(ring, vec![]));
        let total: f64 = parts.iter().map(|p| p.unsigned_area()).sum();
        assert_eq!(parts.len(), 2);
        assert!((total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_collapsed_ring_irreparable() {
        let flat = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]),
            vec![],
        );
        assert_eq!(repair_geometry(&MultiPolygon::new(vec![flat])), None);
    }

    #[test]
    fn test_non_finite_irreparable() {
        let bad = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        assert_eq!(repair_geometry(&MultiPolygon::new(vec![bad])), None);
    }

    #[test]
    fn test_clean_ring_dedupes_and_closes() {
        let ring = LineString::from(vec![(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let cleaned = clean_ring(&ring).unwrap();
        assert_eq!(cleaned.0.len(), 4);
        assert_eq!(cleaned.0.first(), cleaned.0.last());
    }
}
