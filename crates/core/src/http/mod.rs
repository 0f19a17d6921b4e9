//! Request and response snapshots exchanged between pages, the worker,
//! the network and the cache.
//!
//! These are plain values: a [`Response`] is cloned cheaply (the body is a
//! reference-counted [`Bytes`]) so the worker can hand one copy to the caller
//! and persist another in the background.

mod resolve;

use std::borrow::Cow;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

pub use resolve::{UrlError, resolve};

use crate::cache::hash::compute_cache_key;

/// How the page issued the request.
///
/// Only [`RequestMode::Navigate`] matters to the fallback chain; the other
/// modes are kept so requests round-trip faithfully through the MCP surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

impl RequestMode {
    pub fn is_navigation(self) -> bool {
        matches!(self, RequestMode::Navigate)
    }
}

/// An outbound request intercepted from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-case HTTP method.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl Request {
    /// A sub-resource GET request.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Cors, headers: Vec::new(), body: None }
    }

    /// A top-level navigation GET request.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, ..Self::get(url) }
    }

    /// A request with an arbitrary method; the method is upper-cased.
    pub fn with_method(method: &str, url: Url) -> Self {
        Self { method: method.trim().to_ascii_uppercase(), ..Self::get(url) }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// The URL as it takes part in request identity: fragments never do.
    pub fn identity_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url
    }

    /// Request identity used as the cache key (method + URL).
    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, self.identity_url().as_str())
    }
}

/// A response snapshot: status line, headers and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self { status, status_text: status_text.into(), headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Plain-text `503 Service Unavailable` returned when neither the network
    /// nor the cache can answer a sub-resource request.
    pub fn unavailable(message: &str) -> Self {
        Self::new(503, "Service Unavailable", Bytes::copy_from_slice(message.as_bytes()))
            .with_header("Content-Type", "text/plain; charset=utf-8")
    }

    /// Only exact 200 responses are eligible for caching.
    pub fn is_cacheable_status(&self) -> bool {
        self.status == 200
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
