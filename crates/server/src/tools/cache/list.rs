//! cache_list tool implementation.
//!
//! Lists cache generations, or the entries stored in one generation.

use fuec_core::{CacheDb, GenerationInfo};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// Generation whose entries to list. Lists generations when omitted.
    #[serde(default)]
    pub generation: Option<String>,
}

/// Summary of one stored response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntrySummary {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Body length in bytes.
    pub size: usize,
    pub stored_at: String,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum CacheListOutput {
    Generations { generations: Vec<GenerationInfo> },
    Entries { generation: String, entries: Vec<EntrySummary> },
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let output = match params.generation {
        None => CacheListOutput::Generations { generations: cache.list_generations().await? },
        Some(generation) => {
            let entries = cache
                .list_entries(&generation)
                .await?
                .into_iter()
                .map(|entry| EntrySummary {
                    status: entry.response.status,
                    content_type: entry.response.header("content-type").map(str::to_string),
                    size: entry.response.body.len(),
                    method: entry.method,
                    url: entry.url,
                    stored_at: entry.stored_at,
                })
                .collect();
            CacheListOutput::Entries { generation, entries }
        }
    };

    json_result(&output)
}
