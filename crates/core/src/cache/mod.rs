//! SQLite-backed storage for versioned cache generations.
//!
//! This module provides a persistent request/response cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named generations with an all-or-nothing `ready` flag
//! - Entries keyed by a SHA-256 hash of the request identity
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Bulk eviction of stale generations

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CacheEntry;
pub use generations::GenerationInfo;
