//! Core types and shared functionality for the FUEC offline cache manager.
//!
//! This crate provides:
//! - Request/response snapshots and URL resolution
//! - Versioned cache generations with SQLite backend
//! - The worker lifecycle state machine and fetch policy
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod policy;

pub use cache::{CacheDb, CacheEntry, GenerationInfo};
pub use config::{AppConfig, ConfigError, WorkerConfig};
pub use error::Error;
pub use http::{Request, RequestMode, Response};
pub use lifecycle::{Command, Lifecycle, LifecycleEvent, Transition, WorkerState};
pub use policy::{BypassReason, ExclusionMatch, ExclusionSet, Fallback, FetchPlan};
