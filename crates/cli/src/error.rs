use connectors::error::ConnectorError;
use engine_config::error::ConfigError;
use engine_core::error::CacheError;
use engine_runtime::error::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load the configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Connection failed: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Sync loop failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Failed to read from the cache: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}
