//! Coordinate Reference System codes and detection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CRS codes understood by the projection and overlay crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
    /// NAD83 / UTM zone N (EPSG:269zz), zones 1-23
    Nad83Utm(u8),
    /// WGS84 / UTM (EPSG:326zz north, EPSG:327zz south), zones 1-60
    Wgs84Utm { zone: u8, north: bool },
}

impl Default for CrsCode {
    fn default() -> Self {
        CrsCode::Epsg4326
    }
}

impl CrsCode {
    /// Resolve a numeric EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            4269 => Ok(CrsCode::Epsg4269),
            3857 | 900913 => Ok(CrsCode::Epsg3857),
            26901..=26923 => Ok(CrsCode::Nad83Utm((code - 26900) as u8)),
            32601..=32660 => Ok(CrsCode::Wgs84Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(CrsCode::Wgs84Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => Err(CrsParseError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::Epsg3857 => 3857,
            CrsCode::Nad83Utm(zone) => 26900 + *zone as u32,
            CrsCode::Wgs84Utm { zone, north: true } => 32600 + *zone as u32,
            CrsCode::Wgs84Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326" / "epsg:26919"
    /// - "4326"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    pub fn parse(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" {
            return Ok(CrsCode::Epsg4326);
        }

        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;
        Self::from_epsg(code)
    }

    /// Detect the CRS declared by an ESRI `.prj` (WKT1) string.
    ///
    /// An explicit trailing `AUTHORITY["EPSG","nnnn"]` wins; otherwise the
    /// well-known ESRI names for the supported systems are matched.
    pub fn from_prj_wkt(wkt: &str) -> Result<Self, CrsParseError> {
        let upper = wkt.trim().to_uppercase().replace(' ', "_");

        if let Some(code) = outer_authority(wkt) {
            if let Ok(crs) = Self::from_epsg(code) {
                // A nested GEOGCS authority must not override a projected system
                if !(crs.is_geographic() && upper.starts_with("PROJCS")) {
                    return Ok(crs);
                }
            }
        }

        let is_nad83 = upper.contains("NAD_1983")
            || upper.contains("NAD83")
            || upper.contains("NORTH_AMERICAN_1983");

        if upper.starts_with("PROJCS") {
            if upper.contains("WEB_MERCATOR")
                || upper.contains("PSEUDO-MERCATOR")
                || upper.contains("MERCATOR_AUXILIARY_SPHERE")
            {
                return Ok(CrsCode::Epsg3857);
            }

            if let Some((zone, north)) = utm_zone(&upper) {
                if is_nad83 && north && (1..=23).contains(&zone) {
                    return Ok(CrsCode::Nad83Utm(zone));
                }
                if (1..=60).contains(&zone) {
                    return Ok(CrsCode::Wgs84Utm { zone, north });
                }
            }
        } else if upper.starts_with("GEOGCS") {
            if is_nad83 {
                return Ok(CrsCode::Epsg4269);
            }
            if upper.contains("WGS_1984") || upper.contains("WGS_84") || upper.contains("WGS84") {
                return Ok(CrsCode::Epsg4326);
            }
        }

        Err(CrsParseError::UnrecognizedWkt(
            wkt.chars().take(64).collect::<String>(),
        ))
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// Unit label for axis annotation.
    pub fn unit(&self) -> &'static str {
        if self.is_geographic() {
            "deg"
        } else {
            "m"
        }
    }
}

/// Last `AUTHORITY["EPSG","n"]` in a WKT1 string; WKT1 places the outermost
/// object's authority at the end.
fn outer_authority(wkt: &str) -> Option<u32> {
    let upper = wkt.to_uppercase();
    let start = upper.rfind("AUTHORITY[")?;
    let rest = &upper[start + "AUTHORITY[".len()..];
    let end = rest.find(']')?;
    let mut parts = rest[..end].split(',').map(|p| p.trim().trim_matches('"'));
    match (parts.next(), parts.next()) {
        (Some("EPSG"), Some(code)) => code.parse().ok(),
        _ => None,
    }
}

/// Extract `(zone, north)` from names like `UTM_ZONE_19N`.
fn utm_zone(upper: &str) -> Option<(u8, bool)> {
    let start = upper.find("UTM_ZONE_")? + "UTM_ZONE_".len();
    let rest = &upper[start..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let zone: u8 = digits.parse().ok()?;
    let north = rest[digits.len()..].chars().next() != Some('S');
    Some((zone, north))
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Could not determine CRS from WKT: {0}")]
    UnrecognizedWkt(String),
}
