use thiserror::Error;

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    /// PostgreSQL driver error.
    #[error("PostgreSQL connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// TLS connector could not be built.
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[from] native_tls::Error),

    /// The configured root certificate could not be read.
    #[error("Failed to read root certificate {path}: {source}")]
    RootCert {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Redis client error.
    #[error("Redis connection failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The service answered a health check with something unexpected.
    #[error("Unexpected ping response from {service}: {response}")]
    Ping { service: String, response: String },
}
