//! worker_fetch tool implementation.
//!
//! Sends a request through the worker as if a controlled page issued it.

use fuec_client::{ResponseSource, ServiceWorker};
use fuec_core::http::resolve;
use fuec_core::{Error, Request, RequestMode};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// URL to request. Relative paths resolve against the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a top-level page navigation (default: false).
    #[serde(default)]
    pub navigate: bool,

    /// Optional request body for non-GET methods.
    #[serde(default)]
    pub body: Option<String>,

    /// Wait for the background cache write before returning (default: true).
    #[serde(default = "default_await_cache_write")]
    pub await_cache_write: bool,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_await_cache_write() -> bool {
    true
}

/// Output from the worker_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerFetchOutput {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub status_text: String,
    /// Where the response came from: passthrough, network, cache, offline_page or synthesized.
    pub source: ResponseSource,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Whether a cache write was started for this response.
    pub cache_write: bool,
}

impl WorkerFetchParams {
    fn into_request(self, worker: &ServiceWorker) -> Result<Request, Error> {
        if self.method.trim().is_empty() {
            return Err(Error::InvalidInput("method must not be empty".into()));
        }

        let url = resolve(&worker.config().origin, &self.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let mut request = Request::with_method(&self.method, url);
        if self.navigate {
            request.mode = RequestMode::Navigate;
        }
        if let Some(body) = self.body {
            request = request.with_body(body);
        }
        Ok(request)
    }
}

/// Implementation of the worker_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let await_cache_write = params.await_cache_write;
    let request = params.into_request(worker)?;
    let url = request.url.to_string();
    let method = request.method.clone();

    let outcome = worker.fetch(request).await?;
    let cache_write = outcome.cache_write.is_some();
    if let Some(write) = outcome.cache_write
        && await_cache_write
    {
        // Write failures were already logged by the task; the response stands.
        let _ = write.finished().await;
    }

    let response = outcome.response;
    let body = response.text().into_owned();
    let output = WorkerFetchOutput {
        url,
        method,
        status: response.status,
        status_text: response.status_text,
        source: outcome.source,
        headers: response.headers,
        body,
        cache_write,
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{ORIGIN, output, worker};
    use fuec_core::{AppConfig, Response};

    fn params(url: &str) -> WorkerFetchParams {
        serde_json::from_value(serde_json::json!({ "url": url })).unwrap()
    }

    #[test]
    fn test_params_defaults() {
        let p = params("/");
        assert_eq!(p.method, "GET");
        assert!(!p.navigate);
        assert!(p.await_cache_write);
        assert!(p.body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_online_caches_response() {
        let (worker, network) = worker(AppConfig::default()).await;
        worker.install().await.unwrap();
        network.route(&format!("{ORIGIN}/consulta"), Response::new(200, "OK", "datos"));

        let out = output(&fetch_impl(&worker, params("/consulta")).await.unwrap());
        assert_eq!(out["status"], 200);
        assert_eq!(out["source"], "network");
        assert_eq!(out["body"], "datos");
        assert_eq!(out["cache_write"], true);

        network.set_offline(true);
        let out = output(&fetch_impl(&worker, params("/consulta")).await.unwrap());
        assert_eq!(out["source"], "cache");
        assert_eq!(out["body"], "datos");
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_gets_offline_page() {
        let (worker, network) = worker(AppConfig::default()).await;
        worker.install().await.unwrap();
        network.set_offline(true);

        let mut p = params("/reportes");
        p.navigate = true;
        let out = output(&fetch_impl(&worker, p).await.unwrap());
        assert_eq!(out["source"], "offline_page");
        assert_eq!(out["body"], "<h1>Offline</h1>");
    }

    #[tokio::test]
    async fn test_fetch_offline_subresource_is_synthesized() {
        let (worker, network) = worker(AppConfig::default()).await;
        worker.install().await.unwrap();
        network.set_offline(true);

        let out = output(&fetch_impl(&worker, params("/static/app.js")).await.unwrap());
        assert_eq!(out["status"], 503);
        assert_eq!(out["source"], "synthesized");
        assert_eq!(out["body"], "Sin conexión");
    }

    #[tokio::test]
    async fn test_fetch_post_bypasses_worker() {
        let (worker, network) = worker(AppConfig::default()).await;
        worker.install().await.unwrap();
        network.route(&format!("{ORIGIN}/generar"), Response::new(200, "OK", "pdf"));

        let mut p = params("/generar");
        p.method = "post".to_string();
        p.body = Some("placa=ABC123".to_string());
        let out = output(&fetch_impl(&worker, p).await.unwrap());
        assert_eq!(out["method"], "POST");
        assert_eq!(out["source"], "passthrough");
        assert_eq!(out["cache_write"], false);
    }

    #[tokio::test]
    async fn test_fetch_passthrough_network_error() {
        let (worker, network) = worker(AppConfig::default()).await;
        worker.install().await.unwrap();
        network.set_offline(true);

        let mut p = params("/generar");
        p.method = "POST".to_string();
        let err = fetch_impl(&worker, p).await.unwrap_err();
        assert_eq!(err.code.0, -32008);
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_input() {
        let (worker, _) = worker(AppConfig::default()).await;

        let err = fetch_impl(&worker, params("   ")).await.unwrap_err();
        assert_eq!(err.code.0, -32003);

        let mut p = params("/");
        p.method = " ".to_string();
        let err = fetch_impl(&worker, p).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
