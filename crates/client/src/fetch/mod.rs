//! Network transport used by the worker.
//!
//! ### Failure signaling
//! - A rejected request (DNS, connection refused, transport timeout) is a
//!   [`NetworkError`]; this is what triggers the cache fallback chain.
//! - Any HTTP status, including 4xx/5xx, is a successful fetch.
//!
//! ### Transport
//! - reqwest with rustls, gzip/brotli/deflate
//! - The only timeout is the transport's own (`FetchConfig::timeout`)

#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use fuec_core::{AppConfig, Error, Request, Response};
use reqwest::{Client, Method};

/// Errors raised when the transport rejects a request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    #[error("request timeout")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unsupported method: {0}")]
    InvalidMethod(String),

    #[error("network error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Connect(err.to_string())
        } else {
            NetworkError::Other(err.to_string())
        }
    }
}

impl From<NetworkError> for Error {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::InvalidMethod(method) => Error::InvalidInput(format!("unsupported method: {method}")),
            other => Error::Network(other.to_string()),
        }
    }
}

/// Transport seam between the worker and the outside world.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform `request`, resolving to whatever response the server sent.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "fuec-sw/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "fuec-sw/0.1".to_string(), timeout: Duration::from_millis(20000), max_redirects: 5 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), timeout: config.timeout(), ..Self::default() }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new transport with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| NetworkError::InvalidMethod(request.method.clone()))?;

        let mut builder = self.http.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "fuec-sw/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "fuec-test".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "fuec-test");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_network_error_to_core_error() {
        let err: Error = NetworkError::Timeout.into();
        assert!(matches!(err, Error::Network(_)));

        let err: Error = NetworkError::InvalidMethod("BR EW".into()).into();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_http_network_new() {
        let network = HttpNetwork::new(FetchConfig::default());
        assert!(network.is_ok());
    }

    #[tokio::test]
    async fn test_http_network_rejects_bad_method() {
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let url = url::Url::parse("http://localhost:8000/").unwrap();
        let request = Request::with_method("BR EW", url);

        let result = network.fetch(&request).await;
        assert!(matches!(result, Err(NetworkError::InvalidMethod(_))));
    }

    #[tokio::test]
    async fn test_http_network_connection_refused_is_error() {
        let network = HttpNetwork::new(FetchConfig { timeout: Duration::from_secs(2), ..Default::default() }).unwrap();
        let url = url::Url::parse("http://127.0.0.1:9/").unwrap();

        let result = network.fetch(&Request::get(url)).await;
        assert!(result.is_err());
    }
}
