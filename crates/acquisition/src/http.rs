//! HTTP access for the basemap sources.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::config::AcquisitionConfig;
use crate::error::{AcquisitionError, Result};

/// Status and body of a completed GET request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body of a successful response, or a [`AcquisitionError::Status`].
    pub fn into_body(self, url: &str) -> Result<Bytes> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(AcquisitionError::Status {
                url: redact_key(url),
                status: self.status,
            })
        }
    }
}

/// Minimal GET interface every source fetches through.
///
/// Transport failures are errors; HTTP error statuses are returned as
/// responses so sources can tell a rejected key from a missing tile.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// [`HttpFetch`] backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &AcquisitionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!(url = %redact_key(url), "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Replace the value of a `key=` query parameter so URLs can be logged.
pub fn redact_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some(("key", _)) => "key=REDACTED".to_string(),
            _ => pair.to_string(),
        })
        .collect();
    format!("{}?{}", base, query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_key() {
        assert_eq!(
            redact_key("https://maps.example/staticmap?center=1,2&key=secret&zoom=3"),
            "https://maps.example/staticmap?center=1,2&key=REDACTED&zoom=3"
        );
        assert_eq!(redact_key("https://tiles.example/1/2/3.png"), "https://tiles.example/1/2/3.png");
    }

    #[test]
    fn test_error_status_carries_redacted_url() {
        let response = HttpResponse {
            status: 500,
            body: Bytes::new(),
        };
        let err = response.into_body("https://x.example/?key=abc").unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::Status { ref url, status: 500 } if url.ends_with("key=REDACTED")
        ));
    }
}
