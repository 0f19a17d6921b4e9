//! Worker lifecycle tools: install, activate, message, status.

use fuec_client::{ServiceWorker, WorkerMessage};
use fuec_core::WorkerState;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message posted by a page, e.g. `"skipWaiting"` or `{"type": "SKIP_WAITING"}`.
    pub payload: serde_json::Value,
}

/// Output shared by every lifecycle tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    /// Cache generation this instance owns.
    pub generation: String,
    pub state: WorkerState,
    /// Whether intercepted requests are being handled.
    pub controlling: bool,
}

async fn status_of(worker: &ServiceWorker) -> WorkerStatusOutput {
    WorkerStatusOutput {
        generation: worker.generation().to_string(),
        state: worker.state().await,
        controlling: worker.is_controlling(),
    }
}

/// Implementation of the worker_install tool.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    worker.install().await?;
    json_result(&status_of(worker).await)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    worker.activate().await?;
    json_result(&status_of(worker).await)
}

/// Implementation of the worker_message tool.
pub async fn message_impl(worker: &ServiceWorker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    worker.message(&WorkerMessage::parse(&params.payload)).await?;
    json_result(&status_of(worker).await)
}

/// Implementation of the worker_status tool.
pub async fn status_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    json_result(&status_of(worker).await)
}
