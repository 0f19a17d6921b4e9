//! Client runtime for the FUEC offline cache manager.
//!
//! This crate provides the network transport and the `ServiceWorker`
//! runtime that executes lifecycle commands and answers intercepted fetches,
//! shared by the server and tests.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchConfig, HttpNetwork, Network, NetworkError};
pub use worker::{BackgroundWrite, FetchOutcome, ResponseSource, ServiceWorker, WorkerMessage};

#[cfg(any(test, feature = "test-util"))]
pub use fetch::scripted::ScriptedNetwork;
