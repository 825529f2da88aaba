use engine_core::error::{CacheError, SourceError};
use model::error::CursorError;
use thiserror::Error;

/// Errors surfaced by the sync loop.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Unsupported cursor type, malformed template or a persisted cursor
    /// that no longer converts. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Cursor column '{0}' is nil or does not exist")]
    MissingCursorColumn(String),

    #[error("Unable to compare cursor values: {0}")]
    CursorComparison(#[source] CursorError),

    /// Retries ran out; wraps the last failure.
    #[error("Backoff exhausted: {source}")]
    BackoffExhausted {
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// Whether the loop may retry this failure after the first iteration.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Source(_)
            | SyncError::Cache(_)
            | SyncError::MissingCursorColumn(_)
            | SyncError::CursorComparison(_) => true,
            SyncError::Configuration(_) | SyncError::BackoffExhausted { .. } => false,
        }
    }
}
