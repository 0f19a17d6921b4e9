//! fuec-sw server entry point.
//!
//! Boots one worker instance for the configured cache version and serves it
//! as an MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use fuec_client::{FetchConfig, HttpNetwork, ServiceWorker};
use fuec_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker_config = config.worker_config()?;
    let store = CacheDb::open(&config.db_path).await?;
    let network = HttpNetwork::new(FetchConfig::from(&config))?;

    tracing::info!(
        cache_version = %worker_config.cache_version,
        origin = %worker_config.origin,
        db_path = %config.db_path.display(),
        "Starting fuec-sw server on stdio transport"
    );

    let worker = ServiceWorker::new(worker_config, store, Arc::new(network));
    let handler = handler::FuecWorkerServer::new(Arc::new(worker));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
