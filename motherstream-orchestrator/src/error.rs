//! Error types for the motherstream orchestrator
//!
//! Mirrors the error taxonomy in the design notes: invalid input is
//! rejected synchronously at the ingest control surface; compositor
//! errors are either transient (retried once after reconnect) or fatal
//! (the client goes unhealthy until an operator forces a reconnect).

use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Malformed stream-key, unknown user, out-of-range config value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Compositor RPC errors, see [`CompositorError`].
    #[error("Compositor error: {0}")]
    Compositor(#[from] CompositorError),

    /// IO errors from snapshot/CSV file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot/CSV (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing or malformed environment configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server bind/serve errors.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic errors crossing a boundary that doesn't merit its own variant.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors from talking to the scene compositor over its WebSocket RPC.
#[derive(Debug, Error, Clone)]
pub enum CompositorError {
    /// RPC timeout or a dropped connection; the client reconnects and the
    /// call is retried once.
    #[error("transient compositor failure: {0}")]
    Transient(String),

    /// N consecutive reconnect attempts failed; the client is unhealthy
    /// until `force_reconnect` is called.
    #[error("compositor unhealthy: {0}")]
    Fatal(String),
}

/// Result type alias using [`OrchestratorError`]
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Error recovery strategies, attached to an error for the worker/caller
/// to decide whether to retry.
#[derive(Debug, Clone, Copy)]
pub enum RecoveryStrategy {
    Retry { max_attempts: u32, delay_ms: u64 },
    LogAndContinue,
    Fatal,
}

impl OrchestratorError {
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            OrchestratorError::Compositor(CompositorError::Transient(_)) => {
                RecoveryStrategy::Retry { max_attempts: 1, delay_ms: 0 }
            }
            OrchestratorError::Compositor(CompositorError::Fatal(_)) => RecoveryStrategy::Fatal,
            OrchestratorError::Io(_) => RecoveryStrategy::Retry { max_attempts: 2, delay_ms: 200 },
            _ => RecoveryStrategy::LogAndContinue,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidInput(_) => "MS_IN_001",
            OrchestratorError::Compositor(CompositorError::Transient(_)) => "MS_CP_001",
            OrchestratorError::Compositor(CompositorError::Fatal(_)) => "MS_CP_002",
            OrchestratorError::Io(_) => "MS_IO_001",
            OrchestratorError::Json(_) => "MS_JS_001",
            OrchestratorError::Csv(_) => "MS_CSV_001",
            OrchestratorError::Config(_) => "MS_CFG_001",
            OrchestratorError::Http(_) => "MS_HTTP_001",
            OrchestratorError::Other(_) => "MS_OT_001",
        }
    }
}
