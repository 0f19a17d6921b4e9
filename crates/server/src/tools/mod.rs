//! MCP tool implementations.
//!
//! This module contains all tools exposed by the fuec-sw server.

pub mod cache;
pub mod fetch;
pub mod lifecycle;

pub use fetch::WorkerFetchParams;
pub use lifecycle::WorkerMessageParams;

use fuec_core::Error;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
