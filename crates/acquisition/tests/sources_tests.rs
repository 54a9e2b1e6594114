//! Source tests against canned HTTP responses.

use std::sync::{Arc, Mutex};

use acquisition::{
    AcquisitionConfig, AcquisitionError, BasemapRequest, BasemapSource, BathymetryRequest,
    BathymetrySource, DemRequest, DemSource, HttpFetch, HttpResponse, Result, SatelliteConfig,
    SatelliteRequest, SatelliteSource,
};
use async_trait::async_trait;
use bytes::Bytes;
use map_common::{BoundingRegion, CrsCode};
use test_utils::{assert_approx_eq, bbox, solid_png, terrarium_tile_png};

/// Serves fixed responses by URL prefix and records every request.
#[derive(Default)]
struct FakeFetcher {
    routes: Vec<(String, u16, Bytes)>,
    fallback: Option<(u16, Bytes)>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn route(mut self, prefix: &str, status: u16, body: impl Into<Bytes>) -> Self {
        self.routes.push((prefix.to_string(), status, body.into()));
        self
    }

    fn fallback(mut self, status: u16, body: impl Into<Bytes>) -> Self {
        self.fallback = Some((status, body.into()));
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for FakeFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let hit = self
            .routes
            .iter()
            .find(|(prefix, _, _)| url.starts_with(prefix.as_str()))
            .map(|(_, status, body)| (*status, body.clone()))
            .or_else(|| self.fallback.clone());
        match hit {
            Some((status, body)) => Ok(HttpResponse { status, body }),
            None => Ok(HttpResponse {
                status: 404,
                body: Bytes::new(),
            }),
        }
    }
}

/// griddap CSV for a lon/lat box at `step_minutes` spacing.
fn griddap_csv(lon1: f64, lon2: f64, lat1: f64, lat2: f64, step_minutes: u32) -> String {
    let steps = |a: f64, b: f64| ((b - a) * 60.0 / step_minutes as f64).round() as usize;
    let mut out = String::from("latitude,longitude,altitude\ndegrees_north,degrees_east,m\n");
    for k in 0..=steps(lat1, lat2) {
        let lat = lat1 + (k * step_minutes as usize) as f64 / 60.0;
        for m in 0..=steps(lon1, lon2) {
            let lon = lon1 + (m * step_minutes as usize) as f64 / 60.0;
            let depth = -((lon - lon1) * 250.0).round();
            out.push_str(&format!("{},{},{}\n", lat, lon, depth));
        }
    }
    out
}

// ============================================================================
// DEM
// ============================================================================

#[tokio::test]
async fn test_dem_clip_scenario() {
    let tile = terrarium_tile_png(256, |x, _| 10.0 + x as f32 / 8.0);
    let fetcher = Arc::new(FakeFetcher::default().fallback(200, tile));
    let source = DemSource::new(fetcher.clone(), "https://tiles.example/terrarium");

    let (min_x, min_y, max_x, max_y) = bbox::NEST_SURVEY;
    let region = BoundingRegion::lon_lat(min_x, min_y, max_x, max_y).unwrap();
    let raster = source
        .fetch(&DemRequest::new(region, 14).clip(true))
        .await
        .unwrap();

    let extent = raster.extent();
    assert_eq!(raster.crs(), CrsCode::Epsg4326);
    assert!(region.contains(&extent));
    assert_approx_eq!(extent.width(), region.width(), 1e-9);
    assert_approx_eq!(extent.height(), region.height(), 1e-9);

    // Native spacing at zoom 14 is roughly 9.5m
    assert!(raster.width() > 20 && raster.width() < 200);
    let (lo, hi) = raster.value_range().unwrap();
    assert!(lo >= 10.0 && hi < 42.0);

    let requests = fetcher.requests();
    assert!(!requests.is_empty() && requests.len() <= 4);
    assert!(requests.iter().all(|u| u.starts_with("https://tiles.example/terrarium/14/")));
}

#[tokio::test]
async fn test_dem_unclipped_covers_request() {
    let tile = terrarium_tile_png(256, |_, _| -5.0);
    let fetcher = Arc::new(FakeFetcher::default().fallback(200, tile));
    let source = DemSource::new(fetcher.clone(), "https://tiles.example/terrarium/");

    let region = BoundingRegion::lon_lat(-70.619, 42.9842, -70.6094, 42.9928).unwrap();
    let raster = source.fetch(&DemRequest::new(region, 14)).await.unwrap();

    assert!(raster.extent().contains(&region));
    assert_eq!(raster.width() % 256, 0);
    assert_eq!(raster.value_range(), Some((-5.0, -5.0)));
}

#[tokio::test]
async fn test_dem_projected_region() {
    let tile = terrarium_tile_png(256, |_, _| 3.0);
    let fetcher = Arc::new(FakeFetcher::default().fallback(200, tile));
    let source = DemSource::new(fetcher, "https://tiles.example/terrarium");

    let region = BoundingRegion::new(
        345_000.0,
        4_760_000.0,
        346_000.0,
        4_761_000.0,
        CrsCode::Nad83Utm(19),
    )
    .unwrap();
    let raster = source.fetch(&DemRequest::new(region, 12).clip(true)).await.unwrap();
    let extent = raster.extent();
    assert_eq!(extent.crs, CrsCode::Epsg4326);
    assert!(extent.min_x > -71.0 && extent.max_x < -70.8);
}

#[tokio::test]
async fn test_dem_missing_tile_fails() {
    let fetcher = Arc::new(FakeFetcher::default());
    let source = DemSource::new(fetcher, "https://tiles.example/terrarium");
    let region = BoundingRegion::lon_lat(-70.62, 42.98, -70.60, 43.0).unwrap();

    let err = source.fetch(&DemRequest::new(region, 10)).await.unwrap_err();
    assert!(matches!(err, AcquisitionError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_dem_too_many_tiles_rejected_before_fetch() {
    let fetcher = Arc::new(FakeFetcher::default());
    let source = DemSource::new(fetcher.clone(), "https://tiles.example/terrarium");
    let region = BoundingRegion::lon_lat(-80.0, 30.0, -60.0, 50.0).unwrap();

    let err = source.fetch(&DemRequest::new(region, 12)).await.unwrap_err();
    assert!(matches!(err, AcquisitionError::InvalidRequest(_)));
    assert!(fetcher.requests().is_empty());
}

// ============================================================================
// Bathymetry
// ============================================================================

#[tokio::test]
async fn test_bathymetry_scenario_range_matches_request() {
    let csv = griddap_csv(-74.0, -62.0, 37.0, 46.0, 1);
    let fetcher = Arc::new(FakeFetcher::default().route("https://erddap.example/", 200, csv));
    let source = BathymetrySource::new(fetcher.clone(), "https://erddap.example/griddap/etopo180");

    let raster = source
        .fetch(&BathymetryRequest::new(-74.0, -62.0, 37.0, 46.0, 1))
        .await
        .unwrap();

    assert_eq!((raster.width(), raster.height()), (721, 541));
    let (west, north) = raster.grid.cell_center(0, 0).unwrap();
    let (east, south) = raster.grid.cell_center(720, 540).unwrap();
    assert_approx_eq!(west, -74.0, 1e-9);
    assert_approx_eq!(east, -62.0, 1e-9);
    assert_approx_eq!(south, 37.0, 1e-9);
    assert_approx_eq!(north, 46.0, 1e-9);
    assert_approx_eq!(raster.grid.dx(), 1.0 / 60.0, 1e-12);

    let (deepest, shallowest) = raster.value_range().unwrap();
    assert_eq!(shallowest, 0.0);
    assert_eq!(deepest, -3000.0);

    assert_eq!(
        fetcher.requests(),
        vec!["https://erddap.example/griddap/etopo180.csv?altitude[(37):1:(46)][(-74):1:(-62)]"]
    );
}

#[tokio::test]
async fn test_bathymetry_stride() {
    let csv = griddap_csv(-70.0, -69.0, 42.0, 43.0, 10);
    let fetcher = Arc::new(FakeFetcher::default().fallback(200, csv));
    let source = BathymetrySource::new(fetcher, "https://erddap.example/griddap/etopo180");

    let raster = source
        .fetch(&BathymetryRequest::new(-70.0, -69.0, 42.0, 43.0, 10))
        .await
        .unwrap();
    assert_eq!((raster.width(), raster.height()), (7, 7));
}

#[tokio::test]
async fn test_bathymetry_resolution_zero_rejected() {
    let fetcher = Arc::new(FakeFetcher::default());
    let source = BathymetrySource::new(fetcher.clone(), "https://erddap.example/griddap/etopo180");
    let err = source
        .fetch(&BathymetryRequest::new(-74.0, -62.0, 37.0, 46.0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::InvalidRequest(_)));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_bathymetry_service_down() {
    let fetcher = Arc::new(FakeFetcher::default().fallback(503, "unavailable"));
    let source = BathymetrySource::new(fetcher, "https://erddap.example/griddap/etopo180");
    let err = source
        .fetch(&BathymetryRequest::new(-74.0, -62.0, 37.0, 46.0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::Status { status: 503, .. }));
}

// ============================================================================
// Satellite
// ============================================================================

#[tokio::test]
async fn test_satellite_fetch() {
    let fetcher = Arc::new(FakeFetcher::default().fallback(200, solid_png(320, 240, [20, 60, 30])));
    let config = SatelliteConfig::new("https://maps.example/staticmap", "test-key");
    let source = SatelliteSource::new(fetcher.clone(), config);

    let request = SatelliteRequest::new(-70.6142, 42.9885, 15).size(320, 240);
    let raster = source.fetch(&request).await.unwrap();

    assert!(!raster.is_scalar());
    assert_eq!((raster.width(), raster.height()), (320, 240));
    assert_eq!(raster.rgba_at(10, 10), Some([20, 60, 30, 255]));
    assert_eq!(raster.crs(), CrsCode::Epsg3857);
    assert!(fetcher.requests()[0].contains("key=test-key"));
}

#[tokio::test]
async fn test_satellite_rejected_key() {
    let fetcher = Arc::new(FakeFetcher::default().fallback(403, "The provided API key is invalid."));
    let source = SatelliteSource::new(
        fetcher,
        SatelliteConfig::new("https://maps.example/staticmap", "bad-key"),
    );
    let err = source
        .fetch(&SatelliteRequest::new(-70.6142, 42.9885, 15))
        .await
        .unwrap_err();
    match err {
        AcquisitionError::ApiKeyRejected { url, status } => {
            assert_eq!(status, 403);
            assert!(!url.contains("bad-key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_satellite_missing_key() {
    let fetcher = Arc::new(FakeFetcher::default());
    let source = SatelliteSource::new(
        fetcher.clone(),
        SatelliteConfig::new("https://maps.example/staticmap", ""),
    );
    let err = source
        .fetch(&SatelliteRequest::new(-70.6142, 42.9885, 15))
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::MissingApiKey));
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_satellite_undecodable_body() {
    let fetcher = Arc::new(FakeFetcher::default().fallback(200, "<html>not an image</html>"));
    let source = SatelliteSource::new(
        fetcher,
        SatelliteConfig::new("https://maps.example/staticmap", "k"),
    );
    let err = source
        .fetch(&SatelliteRequest::new(-70.6142, 42.9885, 15))
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::Decode(_)));
}

// ============================================================================
// Request selector
// ============================================================================

#[tokio::test]
async fn test_selector_from_yaml() {
    let yaml = "source: bathymetry\nlon1: -70.0\nlon2: -69.0\nlat1: 42.0\nlat2: 43.0\nresolution: 10\n";
    let request: BasemapRequest = serde_yaml::from_str(yaml).unwrap();

    let fetcher = Arc::new(
        FakeFetcher::default().fallback(200, griddap_csv(-70.0, -69.0, 42.0, 43.0, 10)),
    );
    let config = AcquisitionConfig {
        bathymetry_url: "https://erddap.example/griddap/etopo180".to_string(),
        ..Default::default()
    };

    let raster = request.acquire(fetcher, &config, None).await.unwrap();
    assert_eq!(raster.height(), 7);
}

#[tokio::test]
async fn test_selector_satellite_needs_key() {
    let request = BasemapRequest::Satellite(SatelliteRequest::new(0.0, 0.0, 3));
    let err = request
        .acquire(Arc::new(FakeFetcher::default()), &AcquisitionConfig::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AcquisitionError::MissingApiKey));
}
