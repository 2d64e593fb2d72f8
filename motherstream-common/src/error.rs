//! Common error types for the motherstream orchestrator

use thiserror::Error;

/// Common result type for motherstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across the workspace boundary
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
