//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FUEC_SW_*)
//! 2. TOML config file (if FUEC_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::policy::ExclusionMatch;

mod validation;
mod worker;

pub use validation::ConfigError;
pub use worker::WorkerConfig;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FUEC_SW_*)
/// 2. TOML config file (if FUEC_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current cache generation. Bump on every deployment that
    /// changes precached assets.
    ///
    /// Set via FUEC_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Origin of the backend the worker fronts.
    ///
    /// Set via FUEC_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Resources stored at install time, relative to `origin` or absolute.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Page served to offline navigations. Must be part of `precache_urls`.
    ///
    /// Set via FUEC_SW_OFFLINE_PATH environment variable.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// Body of the synthesized 503 for offline sub-resource requests.
    #[serde(default = "default_offline_message")]
    pub offline_message: String,

    /// URL patterns whose responses are never cached.
    #[serde(default = "default_exclusion_patterns")]
    pub exclusion_patterns: Vec<String>,

    /// How `exclusion_patterns` are matched: `substring` or `path_prefix`.
    ///
    /// Set via FUEC_SW_EXCLUSION_MATCH environment variable.
    #[serde(default)]
    pub exclusion_match: ExclusionMatch,

    /// Activate as soon as precache completes instead of waiting for the
    /// previous instance to release its clients.
    ///
    /// Set via FUEC_SW_SKIP_WAITING_ON_INSTALL environment variable.
    #[serde(default = "default_true")]
    pub skip_waiting_on_install: bool,

    /// Path to SQLite cache database.
    ///
    /// Set via FUEC_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FUEC_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds.
    ///
    /// Set via FUEC_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_version() -> String {
    "fuec-v3".into()
}

fn default_origin() -> String {
    "http://localhost:8000".into()
}

fn default_precache_urls() -> Vec<String> {
    vec!["/".into(), "/offline".into()]
}

fn default_offline_path() -> String {
    "/offline".into()
}

fn default_offline_message() -> String {
    "Sin conexión".into()
}

fn default_exclusion_patterns() -> Vec<String> {
    vec!["/validar-vehiculo".into(), "/generar".into()]
}

fn default_true() -> bool {
    true
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./fuec-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "fuec-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            origin: default_origin(),
            precache_urls: default_precache_urls(),
            offline_path: default_offline_path(),
            offline_message: default_offline_message(),
            exclusion_patterns: default_exclusion_patterns(),
            exclusion_match: ExclusionMatch::default(),
            skip_waiting_on_install: true,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FUEC_SW_`
    /// 2. TOML file from `FUEC_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FUEC_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FUEC_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_version, "fuec-v3");
        assert_eq!(config.origin, "http://localhost:8000");
        assert_eq!(config.precache_urls, vec!["/".to_string(), "/offline".to_string()]);
        assert_eq!(config.offline_path, "/offline");
        assert_eq!(config.offline_message, "Sin conexión");
        assert_eq!(config.exclusion_patterns, vec!["/validar-vehiculo".to_string(), "/generar".to_string()]);
        assert_eq!(config.exclusion_match, ExclusionMatch::Substring);
        assert!(config.skip_waiting_on_install);
        assert_eq!(config.db_path, PathBuf::from("./fuec-sw-cache.sqlite"));
        assert_eq!(config.user_agent, "fuec-sw/0.1");
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FUEC_SW_CACHE_VERSION", "fuec-v4");
            jail.set_env("FUEC_SW_EXCLUSION_MATCH", "path_prefix");
            jail.set_env("FUEC_SW_SKIP_WAITING_ON_INSTALL", "false");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.cache_version, "fuec-v4");
            assert_eq!(config.exclusion_match, ExclusionMatch::PathPrefix);
            assert!(!config.skip_waiting_on_install);
            assert_eq!(config.offline_path, "/offline");
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "fuec-sw.toml",
                r#"
                    cache_version = "fuec-staging-v1"
                    origin = "https://fuec.example.com"
                    precache_urls = ["/", "/offline", "/static/css/app.css"]
                "#,
            )?;
            jail.set_env("FUEC_SW_CONFIG_FILE", "fuec-sw.toml");
            jail.set_env("FUEC_SW_TIMEOUT_MS", "5000");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.cache_version, "fuec-staging-v1");
            assert_eq!(config.origin, "https://fuec.example.com");
            assert_eq!(config.precache_urls.len(), 3);
            assert_eq!(config.timeout_ms, 5000);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FUEC_SW_CACHE_VERSION", "");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_version"));
            Ok(())
        });
    }
}
