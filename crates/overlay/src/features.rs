//! Feature sets: geometries with attributes under one CRS.

use std::collections::BTreeMap;
use std::fmt;

use geo::{BoundingRect, MultiPolygon, Point};
use map_common::{BoundingRegion, CrsCode};
use serde::{Deserialize, Serialize};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Null,
}

impl AttributeValue {
    /// Interpret a raw table cell: numbers when they parse, text otherwise.
    pub fn from_cell(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            AttributeValue::Null
        } else if let Ok(n) = cell.parse::<f64>() {
            AttributeValue::Number(n)
        } else {
            AttributeValue::Text(cell.to_string())
        }
    }

    /// Text attribute, `Null` when blank.
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            AttributeValue::Null
        } else {
            AttributeValue::Text(text.to_string())
        }
    }

    /// Equality against a filter value, numeric when both sides are numbers.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            AttributeValue::Text(s) => s == value,
            AttributeValue::Number(n) => value.trim().parse::<f64>().map_or(false, |v| v == *n),
            AttributeValue::Null => false,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Null => Ok(()),
        }
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// Geometry of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    Point(Point<f64>),
    Polygon(MultiPolygon<f64>),
}

impl FeatureGeometry {
    /// `(min_x, min_y, max_x, max_y)`, `None` for empty polygons.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        match self {
            FeatureGeometry::Point(p) => Some((p.x(), p.y(), p.x(), p.y())),
            FeatureGeometry::Polygon(mp) => mp
                .bounding_rect()
                .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(geometry: FeatureGeometry, attributes: Attributes) -> Self {
        Self {
            geometry,
            attributes,
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(FeatureGeometry::Point(Point::new(x, y)), Attributes::new())
    }

    pub fn polygon(geometry: MultiPolygon<f64>) -> Self {
        Self::new(FeatureGeometry::Polygon(geometry), Attributes::new())
    }

    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn is_point(&self) -> bool {
        matches!(self.geometry, FeatureGeometry::Point(_))
    }
}

/// Features sharing one CRS.
///
/// The CRS is fixed at construction; reprojection produces a new set.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    crs: CrsCode,
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new(crs: CrsCode) -> Self {
        Self {
            crs,
            features: Vec::new(),
        }
    }

    pub fn with_features(crs: CrsCode, features: Vec<Feature>) -> Self {
        Self { crs, features }
    }

    pub fn crs(&self) -> CrsCode {
        self.crs
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding region of every feature, in the set's CRS.
    ///
    /// `None` when the set is empty or all features collapse to a single
    /// point (a region needs non-zero width and height).
    pub fn bounds(&self) -> Option<BoundingRegion> {
        let corners = self
            .features
            .iter()
            .filter_map(|f| f.geometry.bounds())
            .flat_map(|(x0, y0, x1, y1)| [(x0, y0), (x1, y1)]);
        BoundingRegion::from_points(corners, self.crs).ok()
    }

    /// Distinct values of an attribute, in first-seen order.
    pub fn attribute_values(&self, name: &str) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for value in self.features.iter().filter_map(|f| f.attribute(name)) {
            let value = value.to_string();
            if !value.is_empty() && !seen.contains(&value) {
                seen.push(value);
            }
        }
        seen
    }
}
