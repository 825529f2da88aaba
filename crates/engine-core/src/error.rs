use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by a [`RowSource`](crate::connectors::source::RowSource).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to connect to source: {0}")]
    Connection(#[source] BoxError),

    #[error("Source query failed: {0}")]
    Query(#[source] BoxError),

    #[error("Failed to decode column '{column}': {reason}")]
    Decode { column: String, reason: String },

    #[error("Source error: {0}")]
    Other(String),
}

/// Errors raised by a [`CacheStore`](crate::connectors::cache::CacheStore).
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to connect to cache: {0}")]
    Connection(#[source] BoxError),

    #[error("Failed to read key '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to execute pipeline of {ops} operations: {source}")]
    Exec {
        ops: usize,
        #[source]
        source: BoxError,
    },

    #[error("Cache error: {0}")]
    Other(String),
}
