//! HTTP client for the upstream JSON:API service.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::context::ClientSettings;
use crate::error::FetchError;
use crate::query::QueryParams;

/// Media type of JSON:API documents.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the rate-limit reset time in epoch seconds.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// User agent string for transitsync.
const USER_AGENT: &str = concat!("transitsync/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// API Client
// ============================================================================

/// HTTP client bound to one upstream base URL.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Client,
    base_url: Arc<Url>,
}

impl ApiClient {
    /// Creates a client from settings.
    pub fn new(settings: &ClientSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_API_MEDIA_TYPE));

        if let Some(key) = settings.api_key.as_deref() {
            let mut value = HeaderValue::from_str(key)
                .map_err(|e| FetchError::Client(format!("Invalid API key: {e}")))?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let inner = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let mut base_url = Url::parse(&settings.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(settings.base_url.clone()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        debug!(base_url = %base_url, api_key = settings.has_api_key(), "API client created");

        Ok(Self {
            inner,
            base_url: Arc::new(base_url),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the URL for a resource path, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = (*self.base_url).clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Performs a GET request and decodes the JSON body.
    #[instrument(skip(self, query), fields(path = %segments.join("/")))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &QueryParams,
    ) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;
        debug!(params = query.len(), "GET request");

        let response = self.inner.get(url).query(query).send().await?;
        let status = response.status();
        debug!(status = %status, "Response received");

        if let Err(err) = check_status(status, response.headers()) {
            warn!(error = %err, "Request failed");
            return Err(err);
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

// ============================================================================
// Status Classification
// ============================================================================

/// Maps a response status onto a [`FetchError`].
///
/// HTTP 429 becomes [`FetchError::RateLimited`] carrying the reset time
/// from the `x-ratelimit-reset` header when it parses as epoch seconds.
pub fn check_status(status: StatusCode, headers: &HeaderMap) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited {
            reset_at: parse_reset_header(headers),
        });
    }

    Err(FetchError::Http {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("Unexpected status")
            .to_string(),
    })
}

/// Reads the rate-limit reset header as epoch seconds.
pub fn parse_reset_header(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(&ClientSettings::default().with_base_url(base)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("https://api.example.com/");
        let url = client.endpoint(&["vehicles", "y1808"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/vehicles/y1808");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://api.example.com/v3");
        let url = client.endpoint(&["routes"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v3/routes");
    }

    #[test]
    fn test_endpoint_encodes_ids() {
        let client = client("https://api.example.com/");
        let url = client.endpoint(&["stops", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/stops/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ApiClient::new(&ClientSettings::default().with_base_url("not a url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_check_status_success() {
        assert!(check_status(StatusCode::OK, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_check_status_rate_limited_with_reset() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from_static("1700000170"));

        let err = check_status(StatusCode::TOO_MANY_REQUESTS, &headers).unwrap_err();
        assert_eq!(
            err,
            FetchError::RateLimited {
                reset_at: Some(1_700_000_170)
            }
        );
    }

    #[test]
    fn test_check_status_rate_limited_with_garbage_reset() {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from_static("soon"));

        let err = check_status(StatusCode::TOO_MANY_REQUESTS, &headers).unwrap_err();
        assert_eq!(err, FetchError::RateLimited { reset_at: None });
    }

    #[test]
    fn test_check_status_other_error() {
        let err = check_status(StatusCode::NOT_FOUND, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_transport());
    }
}
