//! Common test fixtures for field-map tests.
//!
//! Regions used in the scenarios, plus writers that put point tables and
//! shapefiles into temporary directories.

use std::path::{Path, PathBuf};

use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};

/// Common bounding box definitions as (min_lon, min_lat, max_lon, max_lat).
pub mod bbox {
    /// Appledore Island nesting colony survey area
    pub const NEST_SURVEY: (f64, f64, f64, f64) = (-70.619, 42.9842, -70.6094, 42.9928);

    /// Gulf of Maine fishing grounds
    pub const GULF_OF_MAINE: (f64, f64, f64, f64) = (-74.0, 37.0, -62.0, 46.0);

    /// Invalid bbox (min > max)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);
}

/// `.prj` contents for the systems used in tests.
pub mod prj {
    pub const NAD83_UTM_19N: &str = r#"PROJCS["NAD_1983_UTM_Zone_19N",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",-69.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;

    pub const WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
}

/// Creates a fresh temporary directory for fixture files.
pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Writes a delimited point table and returns its path.
pub fn write_point_table(
    dir: &Path,
    name: &str,
    delimiter: u8,
    header: &[&str],
    rows: &[Vec<String>],
) -> PathBuf {
    let path = dir.join(name);
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(&path)
        .expect("failed to create point table");
    writer.write_record(header).expect("failed to write header");
    for row in rows {
        writer.write_record(row).expect("failed to write row");
    }
    writer.flush().expect("failed to flush point table");
    path
}

/// A polygon fixture: rings (first is the outer ring) and a zone name.
pub struct PolygonFixture {
    pub rings: Vec<Vec<(f64, f64)>>,
    pub zone: String,
}

impl PolygonFixture {
    /// Axis-aligned rectangle.
    pub fn rect(zone: &str, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rings: vec![vec![
                (min_x, min_y),
                (min_x, max_y),
                (max_x, max_y),
                (max_x, min_y),
                (min_x, min_y),
            ]],
            zone: zone.to_string(),
        }
    }
}

/// Writes a polygon shapefile with a `ZONE` character field and an
/// optional `.prj` sidecar. Returns the `.shp` path.
pub fn write_polygon_shapefile(
    dir: &Path,
    name: &str,
    polygons: &[PolygonFixture],
    prj: Option<&str>,
) -> PathBuf {
    let path = dir.join(format!("{}.shp", name));
    let zone_field = FieldName::try_from("ZONE").expect("valid field name");
    let table = TableWriterBuilder::new().add_character_field(zone_field, 50);
    let mut writer =
        shapefile::Writer::from_path(&path, table).expect("failed to create shapefile");

    for fixture in polygons {
        let rings = fixture
            .rings
            .iter()
            .enumerate()
            .map(|(k, ring)| {
                let points = ring
                    .iter()
                    .map(|&(x, y)| shapefile::Point::new(x, y))
                    .collect::<Vec<_>>();
                if k == 0 {
                    shapefile::PolygonRing::Outer(points)
                } else {
                    shapefile::PolygonRing::Inner(points)
                }
            })
            .collect::<Vec<_>>();
        let polygon = shapefile::Polygon::with_rings(rings);

        let mut record = Record::default();
        record.insert(
            "ZONE".to_string(),
            FieldValue::Character(Some(fixture.zone.clone())),
        );
        writer
            .write_shape_and_record(&polygon, &record)
            .expect("failed to write polygon");
    }
    drop(writer);

    if let Some(wkt) = prj {
        std::fs::write(path.with_extension("prj"), wkt).expect("failed to write .prj");
    }
    path
}
