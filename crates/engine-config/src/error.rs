use model::error::{CursorError, TemplateError};
use thiserror::Error;

/// Errors produced while reading, overlaying and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Invalid env file: {0}")]
    EnvFile(String),

    #[error("Config is not valid: {0}")]
    Invalid(String),

    #[error("Unsupported driver to build the connection string: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid cursor configuration: {0}")]
    Cursor(#[from] CursorError),

    #[error("Invalid key/value template: {0}")]
    Template(#[from] TemplateError),
}
