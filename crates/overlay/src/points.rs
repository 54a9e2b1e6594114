//! Delimited point tables.
//!
//! Coordinates come from columns identified by name. Source files are not
//! consistent about those names, so a rename map is applied to the header
//! before the lookup (for example `Long` to `longitude`).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use map_common::CrsCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OverlayError, Result};
use crate::features::{AttributeValue, Attributes, Feature, FeatureSet};

fn default_delimiter() -> char {
    ','
}

fn default_lon_column() -> String {
    "longitude".to_string()
}

fn default_lat_column() -> String {
    "latitude".to_string()
}

/// How to read a point table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTableOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_lon_column")]
    pub lon_column: String,
    #[serde(default = "default_lat_column")]
    pub lat_column: String,
    /// Source column name to canonical name.
    #[serde(default)]
    pub renames: BTreeMap<String, String>,
    /// CRS of the coordinates. Plain lon/lat tables are WGS84.
    #[serde(default)]
    pub crs: CrsCode,
}

impl Default for PointTableOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            lon_column: default_lon_column(),
            lat_column: default_lat_column(),
            renames: BTreeMap::new(),
            crs: CrsCode::default(),
        }
    }
}

impl PointTableOptions {
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.renames.insert(from.to_string(), to.to_string());
        self
    }

    pub fn crs(mut self, crs: CrsCode) -> Self {
        self.crs = crs;
        self
    }

    pub fn coordinate_columns(mut self, lon: &str, lat: &str) -> Self {
        self.lon_column = lon.to_string();
        self.lat_column = lat.to_string();
        self
    }
}

/// A row left out of the feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based line in the source, header included.
    pub line: u64,
    pub reason: String,
}

/// Loaded points plus the rows that could not be used.
#[derive(Debug, Clone)]
pub struct PointLoad {
    pub features: FeatureSet,
    pub skipped: Vec<SkippedRow>,
}

/// Read a point table from a file.
pub fn read_point_table(path: impl AsRef<Path>, options: &PointTableOptions) -> Result<PointLoad> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let load = parse_point_table(file, options)?;
    info!(
        path = %path.display(),
        points = load.features.len(),
        skipped = load.skipped.len(),
        crs = %load.features.crs(),
        "Loaded point table"
    );
    Ok(load)
}

/// Parse a point table from any reader.
pub fn parse_point_table<R: Read>(reader: R, options: &PointTableOptions) -> Result<PointLoad> {
    let delimiter = u8::try_from(options.delimiter).map_err(|_| {
        OverlayError::Csv(csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("delimiter {:?} is not a single byte", options.delimiter),
        )))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| options.renames.get(h).cloned().unwrap_or_else(|| h.to_string()))
        .collect();

    let find = |name: &str| {
        header
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| OverlayError::MissingColumn {
                column: name.to_string(),
                available: header.clone(),
            })
    };
    let lon_col = find(&options.lon_column)?;
    let lat_col = find(&options.lat_column)?;

    let mut features = FeatureSet::new(options.crs);
    let mut skipped = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let coord = |c: usize| {
            record
                .get(c)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let (Some(x), Some(y)) = (coord(lon_col), coord(lat_col)) else {
            let reason = format!(
                "unparsable coordinates ({:?}, {:?})",
                record.get(lon_col).unwrap_or(""),
                record.get(lat_col).unwrap_or("")
            );
            warn!(line, %reason, "Skipping point row");
            skipped.push(SkippedRow { line, reason });
            continue;
        };

        let attributes: Attributes = header
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != lon_col && *c != lat_col)
            .map(|(c, name)| {
                let value = record.get(c).map_or(AttributeValue::Null, AttributeValue::from_cell);
                (name.clone(), value)
            })
            .collect();

        features.push(Feature::point(x, y).with_attributes(attributes));
    }

    Ok(PointLoad { features, skipped })
}
