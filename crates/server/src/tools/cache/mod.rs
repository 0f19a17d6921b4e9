//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the SQLite-backed response cache.

pub mod list;

pub use list::{CacheListParams, list_impl};
