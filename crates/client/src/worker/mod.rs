//! Worker runtime: executes lifecycle commands and answers intercepted fetches.
//!
//! The decision logic lives in `fuec_core::lifecycle` and `fuec_core::policy`;
//! this module performs the I/O those decisions ask for and feeds results
//! back into the lifecycle as events.

mod background;
mod message;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fuec_core::policy::{self, BypassReason, Fallback, FetchPlan};
use fuec_core::{CacheDb, Command, Error, Lifecycle, LifecycleEvent, Request, Response, WorkerConfig, WorkerState};
use futures_util::future::try_join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use url::Url;

pub use background::BackgroundWrite;
pub use message::WorkerMessage;

use crate::fetch::Network;

/// Where the delivered response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Not intercepted; straight from the network.
    Passthrough,
    Network,
    Cache,
    OfflinePage,
    /// Built locally because nothing else could answer.
    Synthesized,
}

/// Result of handling one fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
    /// Pending cache write, if the response is being persisted.
    pub cache_write: Option<BackgroundWrite>,
}

/// One worker instance bound to one cache generation.
pub struct ServiceWorker {
    config: WorkerConfig,
    store: CacheDb,
    network: Arc<dyn Network>,
    lifecycle: Mutex<Lifecycle>,
    controlling: AtomicBool,
}

impl ServiceWorker {
    pub fn new(config: WorkerConfig, store: CacheDb, network: Arc<dyn Network>) -> Self {
        let lifecycle = Mutex::new(Lifecycle::new(&config));
        Self { config, store, network, lifecycle, controlling: AtomicBool::new(false) }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn store(&self) -> &CacheDb {
        &self.store
    }

    pub fn generation(&self) -> &str {
        &self.config.cache_version
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.lock().await.state()
    }

    /// True once activation claimed the clients.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    /// Precache the current generation.
    ///
    /// With aggressive activation enabled the worker continues straight into
    /// activation and returns `Activated`.
    ///
    /// # Errors
    ///
    /// Returns `Error::PrecacheFailed` if any precache fetch fails; the worker
    /// is then redundant and the generation is discarded.
    pub async fn install(&self) -> Result<WorkerState, Error> {
        self.dispatch(LifecycleEvent::Install).await
    }

    /// Activate after the previous instance released its clients: evict
    /// stale generations, then claim clients. No-op once activated.
    pub async fn activate(&self) -> Result<WorkerState, Error> {
        self.dispatch(LifecycleEvent::ControllerReleased).await
    }

    /// Handle a message posted by a client page.
    pub async fn message(&self, message: &WorkerMessage) -> Result<WorkerState, Error> {
        match message {
            WorkerMessage::SkipWaiting => self.dispatch(LifecycleEvent::SkipWaiting).await,
            WorkerMessage::Unknown(payload) => {
                tracing::debug!(payload = %payload, "ignoring unrecognized client message");
                Ok(self.state().await)
            }
        }
    }

    /// Mark this instance as replaced by a newer one.
    pub async fn supersede(&self) -> Result<WorkerState, Error> {
        let state = self.dispatch(LifecycleEvent::Superseded).await?;
        self.controlling.store(false, Ordering::SeqCst);
        Ok(state)
    }

    /// Handle an outbound request from a page.
    ///
    /// Intercepted requests never fail: network errors resolve through the
    /// cache, the offline page or a synthesized 503. Requests that are not
    /// intercepted behave exactly like a direct network fetch, errors included.
    pub async fn fetch(&self, request: Request) -> Result<FetchOutcome, Error> {
        let plan = if self.is_controlling() {
            policy::plan_fetch(&request, &self.config.exclusions)
        } else {
            FetchPlan::Bypass(BypassReason::NotControlling)
        };

        match plan {
            FetchPlan::Bypass(reason) => {
                tracing::debug!(method = %request.method, url = %request.url, reason = ?reason, "request not intercepted");
                let response = self.network.fetch(&request).await?;
                Ok(FetchOutcome { response, source: ResponseSource::Passthrough, cache_write: None })
            }
            FetchPlan::NetworkFirst { store_on_success } => Ok(self.network_first(request, store_on_success).await),
        }
    }

    async fn network_first(&self, request: Request, store_on_success: bool) -> FetchOutcome {
        match self.network.fetch(&request).await {
            Ok(response) if response.is_cacheable_status() => {
                let cache_write = if store_on_success {
                    Some(BackgroundWrite::spawn(
                        self.store.clone(),
                        self.config.cache_version.clone(),
                        request,
                        response.clone(),
                    ))
                } else {
                    tracing::debug!(url = %request.url, "excluded endpoint, not caching");
                    None
                };
                FetchOutcome { response, source: ResponseSource::Network, cache_write }
            }
            Ok(response) => FetchOutcome { response, source: ResponseSource::Network, cache_write: None },
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network failed, falling back to cache");
                self.fallback(&request).await
            }
        }
    }

    async fn fallback(&self, request: &Request) -> FetchOutcome {
        if let Some(response) = self.lookup(request).await {
            return FetchOutcome { response, source: ResponseSource::Cache, cache_write: None };
        }

        if policy::fallback_for(request) == Fallback::OfflinePage {
            let offline = Request::get(self.config.offline_url.clone());
            if let Some(response) = self.lookup(&offline).await {
                return FetchOutcome { response, source: ResponseSource::OfflinePage, cache_write: None };
            }
            tracing::warn!(offline_url = %self.config.offline_url, "offline page missing from cache");
        }

        FetchOutcome {
            response: Response::unavailable(&self.config.offline_message),
            source: ResponseSource::Synthesized,
            cache_write: None,
        }
    }

    /// Storage failures count as a miss.
    async fn lookup(&self, request: &Request) -> Option<Response> {
        match self.store.match_entry(&self.config.cache_version, request).await {
            Ok(entry) => entry.map(|e| e.response),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Feed `event` to the lifecycle and run the resulting commands until
    /// no follow-up events remain.
    ///
    /// A failed precache or cleanup is reported to the lifecycle as an event
    /// first and returned to the caller once the lifecycle has settled.
    async fn dispatch(&self, event: LifecycleEvent) -> Result<WorkerState, Error> {
        let mut pending = VecDeque::from([event]);
        let mut failure = None;

        while let Some(event) = pending.pop_front() {
            let commands = self.lifecycle.lock().await.apply(&event)?;
            for command in commands {
                if let Some(next) = self.execute(command, &mut failure).await? {
                    pending.push_back(next);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(self.state().await),
        }
    }

    async fn execute(&self, command: Command, failure: &mut Option<Error>) -> Result<Option<LifecycleEvent>, Error> {
        match command {
            Command::Precache { generation, urls } => match self.precache(&generation, &urls).await {
                Ok(()) => Ok(Some(LifecycleEvent::PrecacheCompleted)),
                Err(err) => {
                    tracing::warn!(generation = %generation, error = %err, "install failed");
                    *failure = Some(err);
                    Ok(Some(LifecycleEvent::PrecacheFailed))
                }
            },
            Command::DiscardGeneration { generation } => {
                if !self.store.is_generation_ready(&generation).await? {
                    self.store.delete_generation(&generation).await?;
                }
                Ok(None)
            }
            Command::DeleteStaleGenerations { keep } => match self.store.delete_generations_except(&keep).await {
                Ok(deleted) => {
                    if !deleted.is_empty() {
                        tracing::info!(keep = %keep, deleted = ?deleted, "evicted stale cache generations");
                    }
                    Ok(Some(LifecycleEvent::CleanupCompleted))
                }
                Err(err) => {
                    tracing::warn!(keep = %keep, error = %err, "stale generation cleanup failed");
                    *failure = Some(err);
                    Ok(Some(LifecycleEvent::CleanupFailed))
                }
            },
            Command::ClaimClients => {
                self.controlling.store(true, Ordering::SeqCst);
                tracing::info!(generation = %self.config.cache_version, "worker now controls clients");
                Ok(None)
            }
        }
    }

    /// Fetch every URL and commit them together, or commit nothing.
    ///
    /// URLs matching the exclusion set are skipped.
    async fn precache(&self, generation: &str, urls: &[Url]) -> Result<(), Error> {
        self.store.open_generation(generation).await?;
        if self.store.is_generation_ready(generation).await? {
            tracing::debug!(generation = %generation, "generation already precached");
            return Ok(());
        }

        let included = urls.iter().filter(|url| match self.config.exclusions.matching_pattern(url) {
            Some(pattern) => {
                tracing::warn!(url = %url, pattern = %pattern, "excluded URL in precache set, skipping");
                false
            }
            None => true,
        });
        let fetches = included.map(|url| async move {
            let request = Request::get(url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::PrecacheFailed(format!("{url}: {e}")))?;
            if !response.is_cacheable_status() {
                return Err(Error::PrecacheFailed(format!("{url}: status {}", response.status)));
            }
            Ok((request, response))
        });
        let entries = try_join_all(fetches).await?;

        self.store.commit_precache(generation, &entries).await?;
        tracing::info!(generation = %generation, entries = entries.len(), "precache committed");
        Ok(())
    }
}
