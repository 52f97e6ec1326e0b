//! Isochrone fetch client.
//!
//! One outbound POST per call to an OpenRouteService-style
//! `/v2/isochrones/<profile>` endpoint using the curl crate (libcurl). No
//! retries or caching here; the batch loop owns retry and pacing.

mod error;
mod parse;
mod request;

use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::IsoConfig;
use crate::point::Point;

pub use error::FetchError;
pub use parse::{Feature, FeatureCollection};
pub use request::IsochroneRequest;

/// Polygons returned for one point, keyed by the originating point.
#[derive(Debug, Clone, PartialEq)]
pub struct IsochroneResult {
    pub point: Point,
    pub range_seconds: NonZeroU32,
    pub features: FeatureCollection,
}

impl IsochroneResult {
    pub fn new(request: &IsochroneRequest, features: FeatureCollection) -> Self {
        Self {
            point: request.point.clone(),
            range_seconds: request.range_seconds,
            features,
        }
    }
}

/// Something that can turn one request into polygons with exactly one call.
///
/// Implementations are blocking; the batch loop runs them on tokio's blocking pool.
pub trait IsochroneSource: Send + Sync + 'static {
    fn fetch(&self, request: &IsochroneRequest) -> Result<IsochroneResult, FetchError>;
}

/// Production client: libcurl POST with JSON body.
#[derive(Debug, Clone)]
pub struct CurlClient {
    endpoint: String,
    api_key: Option<String>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
        }
    }

    /// Client configured from `IsoConfig` (endpoint, resolved API key, timeouts).
    pub fn from_config(cfg: &IsoConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            api_key: cfg.resolved_api_key(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, total: Duration) -> Self {
        self.connect_timeout = connect;
        self.timeout = total;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl IsochroneSource for CurlClient {
    fn fetch(&self, request: &IsochroneRequest) -> Result<IsochroneResult, FetchError> {
        let body = request.body();
        let mut response: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.endpoint)?;
        easy.post(true)?;
        easy.post_fields_copy(body.as_bytes())?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json")?;
        list.append("Accept: application/json, application/geo+json")?;
        if let Some(key) = self.api_key.as_deref().map(str::trim) {
            if !key.is_empty() {
                list.append(&format!("Authorization: {}", key))?;
            }
        }
        easy.http_headers(list)?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(
            endpoint = %self.endpoint,
            status,
            bytes = response.len(),
            "isochrone response"
        );
        if !(200..300).contains(&status) {
            return Err(FetchError::Http {
                status,
                body: String::from_utf8_lossy(&response).into_owned(),
            });
        }

        let features = parse::parse_feature_collection(&response)?;
        Ok(IsochroneResult::new(request, features))
    }
}
