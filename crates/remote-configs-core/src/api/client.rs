//! HTTP implementation of `NetworkProvider`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use tracing::{debug, warn};

use super::{ApiError, NetworkProvider};
use crate::snapshot::ConfigSnapshot;

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fetches configs over HTTP.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetworkProvider {
    client: Client,
}

impl HttpNetworkProvider {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, ApiError> {
        let mut map = HeaderMap::new();
        map.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(format!("name {:?}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(format!("value for {}", name)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl NetworkProvider for HttpNetworkProvider {
    async fn request_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<Option<ConfigSnapshot>, ApiError> {
        let response = self
            .client
            .get(url)
            .headers(Self::build_headers(headers)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let body = response.text().await?;
        match ConfigSnapshot::from_json_str(&body) {
            Ok(configs) => {
                debug!(url = url, keys = configs.values().len(), "Fetched remote configs");
                Ok(Some(configs))
            }
            Err(e) => {
                warn!(url = url, error = %e, "Remote configs are not a JSON object");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_headers() {
        let mut headers = HashMap::new();
        headers.insert("X-Api-Key".to_string(), "secret".to_string());
        headers.insert("x-app-version".to_string(), "1.2.3".to_string());

        let map = HttpNetworkProvider::build_headers(&headers).expect("headers");
        assert_eq!(map.get("x-api-key").and_then(|v| v.to_str().ok()), Some("secret"));
        assert_eq!(map.get("X-App-Version").and_then(|v| v.to_str().ok()), Some("1.2.3"));
        assert_eq!(map.get(ACCEPT).and_then(|v| v.to_str().ok()), Some("application/json"));
    }

    #[test]
    fn test_build_headers_rejects_invalid() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "value".to_string());
        assert!(matches!(
            HttpNetworkProvider::build_headers(&headers),
            Err(ApiError::InvalidHeader(_))
        ));

        let mut headers = HashMap::new();
        headers.insert("X-Ok".to_string(), "line\nbreak".to_string());
        assert!(matches!(
            HttpNetworkProvider::build_headers(&headers),
            Err(ApiError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_caller_can_override_accept() {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json; version=2".to_string());
        let map = HttpNetworkProvider::build_headers(&headers).expect("headers");
        assert_eq!(map.get_all(ACCEPT).iter().count(), 1);
        assert_eq!(
            map.get(ACCEPT).and_then(|v| v.to_str().ok()),
            Some("application/json; version=2")
        );
    }
}
