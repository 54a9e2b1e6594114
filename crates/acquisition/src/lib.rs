//! Basemap acquisition.
//!
//! Every source turns a request into a georeferenced [`RasterImage`]:
//!
//! - [`SatelliteSource`]: static-map imagery framed by center and zoom
//! - [`DemSource`]: Terrarium elevation tiles mosaicked over a region
//! - [`BathymetrySource`]: ERDDAP griddap CSV subsets of a global relief grid
//!
//! All network access goes through the [`HttpFetch`] trait. Requests are
//! issued one at a time and never cached or retried.
//!
//! [`RasterImage`]: map_common::RasterImage

pub mod bathymetry;
pub mod config;
pub mod dem;
pub mod error;
pub mod http;
pub mod satellite;
pub mod source;
pub mod tile;

pub use bathymetry::{BathymetryRequest, BathymetrySource};
pub use config::AcquisitionConfig;
pub use dem::{decode_terrarium, DemRequest, DemSource};
pub use error::{AcquisitionError, Result};
pub use http::{HttpFetch, HttpResponse, ReqwestFetcher};
pub use satellite::{MapType, SatelliteConfig, SatelliteRequest, SatelliteSource};
pub use source::{BasemapRequest, BasemapSource};
pub use tile::TileCoord;
