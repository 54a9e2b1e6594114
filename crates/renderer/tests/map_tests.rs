//! Tests for map building and composed rendering.

use geo::{polygon, MultiPolygon};
use grid_processor::{PointSample, PointSamples};
use map_common::{BoundingRegion, Color, CrsCode, GridSpec, RasterImage};
use overlay::{Feature, FeatureSet};
use renderer::{
    ColorScale, DisplaySpec, Layer, MapProduct, MarkerShape, PointStyle, PolygonStyle, RenderConfig,
    RenderError, BATHYMETRY_COLORS,
};
use test_utils::fixtures::temp_dir;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: Color = Color::rgb(0, 160, 0);

fn region(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingRegion {
    BoundingRegion::lon_lat(min_x, min_y, max_x, max_y).unwrap()
}

fn red_basemap(extent: BoundingRegion) -> RasterImage {
    let pixels = RED.repeat(16);
    RasterImage::rgba(GridSpec::new(4, 4, extent), pixels).unwrap()
}

fn square(crs: CrsCode, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> FeatureSet {
    let poly = polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
        (x: min_x, y: min_y),
    ];
    FeatureSet::with_features(crs, vec![Feature::polygon(MultiPolygon(vec![poly]))])
}

fn bare() -> renderer::MapBuilder {
    MapProduct::builder().legend(false).axis_labels(false)
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder_preserves_layer_order() {
    let extent = region(0.0, 0.0, 1.0, 1.0);
    let map = MapProduct::builder()
        .points(FeatureSet::new(CrsCode::Epsg4326), PointStyle::default())
        .basemap(red_basemap(extent))
        .polygons(square(CrsCode::Epsg4326, 0.0, 0.0, 1.0, 1.0), PolygonStyle::default())
        .build();

    let names: Vec<&str> = map.layers().iter().map(Layer::name).collect();
    assert_eq!(names, vec!["points", "basemap", "polygons"]);
}

#[test]
fn test_last_crs_and_limits_win() {
    let map = MapProduct::builder()
        .crs(CrsCode::Epsg3857)
        .limits(region(0.0, 0.0, 1.0, 1.0))
        .crs(CrsCode::Epsg4326)
        .limits(region(-71.0, 42.0, -70.0, 43.0))
        .build();

    assert_eq!(map.display_crs(), CrsCode::Epsg4326);
    let limits = map.limits().unwrap();
    assert_eq!((limits.min_x, limits.max_y), (-71.0, 43.0));
}

#[test]
fn test_limits_default_to_basemap_then_layer_union() {
    let extent = region(0.0, 0.0, 4.0, 4.0);
    let map = bare()
        .basemap(red_basemap(extent))
        .polygons(square(CrsCode::Epsg4326, 10.0, 10.0, 20.0, 20.0), PolygonStyle::default())
        .build();
    assert_eq!(map.limits().unwrap(), extent);

    let map = bare()
        .polygons(square(CrsCode::Epsg4326, 0.0, 0.0, 1.0, 1.0), PolygonStyle::default())
        .polygons(square(CrsCode::Epsg4326, 5.0, 5.0, 6.0, 7.0), PolygonStyle::default())
        .build();
    let limits = map.limits().unwrap();
    assert_eq!((limits.min_x, limits.min_y, limits.max_x, limits.max_y), (0.0, 0.0, 6.0, 7.0));
}

#[test]
fn test_display_spec_from_yaml() {
    let yaml = r##"
crs: EPSG:4326
legend: false
width: 1024
height: 768
background: "#F0F0F0"
limits: { min_x: -74.0, min_y: 37.0, max_x: -62.0, max_y: 46.0 }
"##;
    let display: DisplaySpec = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(display.crs, Some(CrsCode::Epsg4326));
    assert!(!display.legend);
    assert!(display.axis_labels);
    assert_eq!((display.width, display.height), (1024, 768));
    assert_eq!(display.background, Color::rgb(0xF0, 0xF0, 0xF0));
    assert_eq!(display.limits.unwrap().min_x, -74.0);
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_later_layers_draw_on_top() {
    let extent = region(0.0, 0.0, 4.0, 4.0);
    let cover = square(CrsCode::Epsg4326, -1.0, -1.0, 5.0, 5.0);
    let config = RenderConfig::default();

    let img = bare()
        .size(40, 40)
        .basemap(red_basemap(extent))
        .polygons(cover.clone(), PolygonStyle::default().fill(GREEN).no_outline())
        .build()
        .render(&config)
        .unwrap();
    assert_eq!(img.get_pixel(20, 20).0, GREEN.to_array());

    let img = bare()
        .size(40, 40)
        .polygons(cover, PolygonStyle::default().fill(GREEN).no_outline())
        .basemap(red_basemap(extent))
        .build()
        .render(&config)
        .unwrap();
    assert_eq!(img.get_pixel(20, 20).0, RED);
}

#[test]
fn test_bathymetry_fill_colors_cells() {
    let samples = PointSamples::new(
        CrsCode::Epsg4326,
        (1.0, 1.0),
        vec![
            PointSample { x: 0.5, y: 1.5, value: -4000.0 },
            PointSample { x: 1.5, y: 1.5, value: -4000.0 },
            PointSample { x: 0.5, y: 0.5, value: -10.0 },
            PointSample { x: 1.5, y: 0.5, value: 25.0 },
        ],
    );
    let img = bare()
        .size(20, 20)
        .raster_fill(samples, ColorScale::Bathymetry { land: None })
        .build()
        .render(&RenderConfig::default())
        .unwrap();

    assert_eq!(img.get_pixel(5, 5).0, BATHYMETRY_COLORS[0].to_array());
    assert_eq!(img.get_pixel(15, 5).0, BATHYMETRY_COLORS[0].to_array());
    assert_eq!(img.get_pixel(5, 15).0, BATHYMETRY_COLORS[12].to_array());
    // Land stays background
    assert_eq!(img.get_pixel(15, 15).0, [255, 255, 255, 255]);
}

#[test]
fn test_projected_polygons_render_in_lon_lat() {
    let zones = square(CrsCode::Nad83Utm(19), 340_000.0, 4_760_000.0, 352_000.0, 4_772_000.0);
    let map = bare()
        .size(50, 50)
        .polygons(zones, PolygonStyle::default().fill(GREEN))
        .crs(CrsCode::Epsg4326)
        .build();

    let limits = map.limits().unwrap();
    assert!(limits.min_x > -71.0 && limits.max_x < -70.7);
    assert!(limits.min_y > 42.9 && limits.max_y < 43.2);

    let img = map.render(&RenderConfig::default()).unwrap();
    assert_eq!(img.get_pixel(25, 25).0, GREEN.to_array());
}

#[test]
fn test_point_markers_centered_on_location() {
    let nests = FeatureSet::with_features(CrsCode::Epsg4326, vec![Feature::point(-70.614, 42.988)]);
    let blue = Color::rgb(0, 0, 255);
    let img = bare()
        .size(100, 100)
        .limits(region(-70.619, 42.983, -70.609, 42.993))
        .points(nests, PointStyle::new(MarkerShape::Square, 10.0).fill(blue).outline(None))
        .build()
        .render(&RenderConfig::default())
        .unwrap();

    assert_eq!(img.get_pixel(50, 50).0, blue.to_array());
    assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
}

#[test]
fn test_axes_frame_without_font() {
    let config = RenderConfig {
        font_path: Some("/nonexistent/font.ttf".into()),
        ..Default::default()
    };
    let img = MapProduct::builder()
        .size(400, 300)
        .legend(false)
        .basemap(red_basemap(region(0.0, 0.0, 4.0, 3.0)))
        .build()
        .render(&config)
        .unwrap();

    // Plot area starts after the axis margin; frame sits one pixel outside it
    assert_eq!(img.get_pixel(55, 100).0, [0, 0, 0, 255]);
    assert_eq!(img.get_pixel(200, 100).0, RED);
    assert_eq!(img.get_pixel(20, 100).0, [255, 255, 255, 255]);
}

#[test]
fn test_legend_panel_shows_swatches() {
    let samples = PointSamples::new(
        CrsCode::Epsg4326,
        (1.0, 1.0),
        vec![PointSample { x: 0.5, y: 0.5, value: -100.0 }],
    );
    let img = MapProduct::builder()
        .size(300, 100)
        .axis_labels(false)
        .raster_fill(samples, ColorScale::default())
        .build()
        .render(&RenderConfig::default())
        .unwrap();

    // Shallowest bucket on top of the legend panel
    assert_eq!(img.get_pixel(199, 7).0, BATHYMETRY_COLORS[12].to_array());
}

#[test]
fn test_empty_product_has_nothing_to_render() {
    let result = MapProduct::builder().build().render(&RenderConfig::default());
    assert!(matches!(result, Err(RenderError::NothingToRender)));
}

#[test]
fn test_zero_size_rejected() {
    let result = bare()
        .size(0, 100)
        .basemap(red_basemap(region(0.0, 0.0, 1.0, 1.0)))
        .build()
        .render(&RenderConfig::default());
    assert!(matches!(result, Err(RenderError::InvalidSize { .. })));
}

#[test]
fn test_save_png_round_trip() {
    let dir = temp_dir();
    let path = dir.path().join("maps").join("survey.png");
    bare()
        .size(64, 48)
        .basemap(red_basemap(region(0.0, 0.0, 4.0, 3.0)))
        .build()
        .save_png(&path, &RenderConfig::default())
        .unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 48));
    assert_eq!(img.get_pixel(32, 24).0, RED);
}
