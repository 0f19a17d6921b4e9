//! In-memory [`Network`] with scripted responses and a connectivity switch.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use fuec_core::{Request, Response};

use super::{Network, NetworkError};

/// Serves canned responses by URL; unknown URLs get a 404.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    log: Mutex<Vec<(String, String)>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `url` (full URL text) with `response`.
    pub fn route(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    /// Reject every request with a connection error while `offline` is set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of requests seen for `url`, whatever their outcome.
    pub fn request_count(&self, url: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|(_, seen)| seen == url).count()
    }

    /// `(method, url)` of every request seen, in order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = request.url.to_string();
        self.log.lock().unwrap().push((request.method.clone(), url.clone()));

        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Connect(format!("{url}: network unreachable")));
        }

        let routed = self.routes.lock().unwrap().get(&url).cloned();
        Ok(routed.unwrap_or_else(|| Response::new(404, "Not Found", "Not Found")))
    }
}
