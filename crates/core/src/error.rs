//! Unified error types for the offline cache manager.
//!
//! Every variant renders with a stable code prefix that is also mapped to a
//! JSON-RPC error code for the MCP surface.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::lifecycle::{LifecycleEvent, WorkerState};

/// Unified error types for the offline cache manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown HTTP method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be resolved against the origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The transport rejected the request (DNS, connection, timeout).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// A precache fetch failed, aborting the install attempt.
    #[error("PRECACHE_FAILED: {0}")]
    PrecacheFailed(String),

    /// The lifecycle does not accept this event in its current state.
    #[error("INVALID_TRANSITION: {event:?} not accepted while {state}")]
    InvalidTransition { state: WorkerState, event: LifecycleEvent },

    /// The worker instance was superseded or failed to install.
    #[error("WORKER_REDUNDANT: {0}")]
    Redundant(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// A background task panicked or was cancelled.
    #[error("TASK_FAILED: {0}")]
    TaskFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InvalidUrl(_) => -32003,
            Error::Network(_) => -32008,
            Error::PrecacheFailed(_) => -32020,
            Error::InvalidTransition { .. } => -32021,
            Error::Redundant(_) => -32022,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => -32002,
            Error::TaskFailed(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PrecacheFailed("http://localhost:8000/offline: status 404".to_string());
        assert!(err.to_string().starts_with("PRECACHE_FAILED"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = Error::InvalidTransition { state: WorkerState::Redundant, event: LifecycleEvent::Install };
        assert_eq!(err.to_string(), "INVALID_TRANSITION: Install not accepted while redundant");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::InvalidInput("bad method".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32602);
        assert!(mcp_err.message.contains("bad method"));
    }
}
