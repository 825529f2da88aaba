use crate::error::CliError;
use async_trait::async_trait;
use connectors::{cache::redis::RedisCache, sql::postgres::source::PgRowSource};
use engine_config::settings::Config;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};

/// Trait for "pinging" a service the worker depends on
#[async_trait]
pub trait ConnectionPinger {
    fn service(&self) -> &'static str;

    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct PostgresConnectionPinger {
    pub conn_str: String,
    pub root_cert: Option<PathBuf>,
}

pub struct RedisConnectionPinger {
    pub url: String,
}

impl PostgresConnectionPinger {
    pub fn from_config(config: &Config) -> Result<Self, CliError> {
        Ok(Self {
            conn_str: config.db.connection_string()?,
            root_cert: config.db.root_cert().map(PathBuf::from),
        })
    }

    pub async fn connect(&self) -> Result<PgRowSource, CliError> {
        let source = PgRowSource::connect(&self.conn_str, self.root_cert.clone())
            .await
            .map_err(|e| {
                error!(error = %e, "Postgres connection failed");
                e
            })?;
        source.ping().await?;
        Ok(source)
    }
}

impl RedisConnectionPinger {
    pub fn from_config(config: &Config) -> Self {
        Self {
            url: config.redis.connection_url(),
        }
    }

    pub async fn connect(&self) -> Result<RedisCache, CliError> {
        let cache = RedisCache::connect(&self.url).await.map_err(|e| {
            error!(error = %e, "Redis connection failed");
            e
        })?;
        cache.ping().await?;
        Ok(cache)
    }
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    fn service(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), CliError> {
        self.connect().await?;
        info!("Postgres ping succeeded");
        Ok(())
    }
}

#[async_trait]
impl ConnectionPinger for RedisConnectionPinger {
    fn service(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), CliError> {
        self.connect().await?;
        info!("Redis ping succeeded");
        Ok(())
    }
}

/// Connects to both services, pinging each before handing them out.
pub async fn connect_all(
    config: &Config,
) -> Result<(Arc<PgRowSource>, Arc<RedisCache>), CliError> {
    let source = PostgresConnectionPinger::from_config(config)?.connect().await?;
    info!("Connected to db");

    let cache = RedisConnectionPinger::from_config(config).connect().await?;
    info!("Connected to redis");

    Ok((Arc::new(source), Arc::new(cache)))
}
