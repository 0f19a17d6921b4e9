//! Resolved, versioned configuration handed to a worker instance.

use url::Url;

use super::{AppConfig, ConfigError};
use crate::http::resolve;
use crate::policy::ExclusionSet;

/// Everything a worker instance needs, with URLs already resolved.
///
/// Two workers built from configs with different `cache_version` values
/// never touch each other's generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub cache_version: String,
    pub origin: Url,
    pub precache: Vec<Url>,
    pub offline_url: Url,
    pub offline_message: String,
    pub exclusions: ExclusionSet,
    pub skip_waiting_on_install: bool,
}

impl AppConfig {
    /// Validate and resolve into a [`WorkerConfig`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` under the same rules as [`AppConfig::validate`].
    pub fn worker_config(&self) -> Result<WorkerConfig, ConfigError> {
        self.validate()?;

        let origin = self.origin_url()?;
        let resolve_field = |field: &str, input: &str| {
            resolve(&origin, input).map_err(|e| ConfigError::Invalid { field: field.into(), reason: e.to_string() })
        };

        let mut precache: Vec<Url> = Vec::with_capacity(self.precache_urls.len());
        for entry in &self.precache_urls {
            let url = resolve_field("precache_urls", entry)?;
            if !precache.contains(&url) {
                precache.push(url);
            }
        }

        let offline_url = resolve_field("offline_path", &self.offline_path)?;

        Ok(WorkerConfig {
            cache_version: self.cache_version.trim().to_string(),
            origin,
            precache,
            offline_url,
            offline_message: self.offline_message.clone(),
            exclusions: ExclusionSet::new(self.exclusion_patterns.iter().cloned(), self.exclusion_match),
            skip_waiting_on_install: self.skip_waiting_on_install,
        })
    }
}
