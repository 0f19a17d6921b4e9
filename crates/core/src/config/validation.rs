//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use crate::http::resolve;
use crate::policy::ExclusionSet;
use thiserror::Error;
use url::Url;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Parse `origin` as an http(s) base URL.
    pub(crate) fn origin_url(&self) -> Result<Url, ConfigError> {
        let origin = Url::parse(self.origin.trim()).map_err(|e| invalid("origin", e.to_string()))?;
        match origin.scheme() {
            "http" | "https" => Ok(origin),
            scheme => Err(invalid("origin", format!("unsupported scheme: {scheme}"))),
        }
    }

    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_version` is empty
    /// - `origin` is not an http(s) URL
    /// - `precache_urls` is empty, holds an unresolvable URL or lacks `offline_path`
    /// - an exclusion pattern is empty
    /// - a precache URL matches an exclusion pattern
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }

        let origin = self.origin_url()?;

        if self.precache_urls.is_empty() {
            return Err(invalid("precache_urls", "must list at least the offline page"));
        }
        let mut precache = Vec::with_capacity(self.precache_urls.len());
        for entry in &self.precache_urls {
            let url = resolve(&origin, entry).map_err(|e| invalid("precache_urls", format!("{entry:?}: {e}")))?;
            precache.push(url);
        }

        let offline = resolve(&origin, &self.offline_path).map_err(|e| invalid("offline_path", e.to_string()))?;
        if !precache.contains(&offline) {
            return Err(invalid("offline_path", format!("{} must be part of precache_urls", self.offline_path)));
        }

        if self.exclusion_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("exclusion_patterns", "patterns must not be empty"));
        }
        let exclusions = ExclusionSet::new(self.exclusion_patterns.iter().cloned(), self.exclusion_match);
        for url in &precache {
            if let Some(pattern) = exclusions.matching_pattern(url) {
                return Err(invalid("precache_urls", format!("{url} matches exclusion pattern {pattern:?}")));
            }
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.exclusion_patterns.is_empty() {
            tracing::warn!("no exclusion patterns configured; every successful GET will be cached");
        }

        Ok(())
    }
}
