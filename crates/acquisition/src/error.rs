//! Error types for basemap acquisition.

use map_common::MapError;
use thiserror::Error;

/// Errors that can occur while fetching a basemap.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Request rejected before any network access.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No API key was configured for a keyed service.
    #[error("no API key configured for the satellite service")]
    MissingApiKey,

    /// The service refused the configured API key.
    #[error("API key rejected by {url} (HTTP {status})")]
    ApiKeyRejected { url: String, status: u16 },

    /// Transport failure (DNS, connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body was not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The response body was not valid CSV.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The response parsed but did not hold the expected data.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The fetched data could not be georeferenced.
    #[error(transparent)]
    Map(#[from] MapError),
}

/// Result type for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquisitionError>;
