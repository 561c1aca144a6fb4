//! Sync engine error types

use thiserror::Error;

/// Errors raised by the reconcile engine
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Provider IP list unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
