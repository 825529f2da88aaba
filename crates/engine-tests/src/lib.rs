#![allow(dead_code)]

//! Tests against live PostgreSQL and Redis instances.
//!
//! Connection settings come from the same `WORKER_*` variables the worker
//! reads, falling back to the defaults (`localhost:5432`, `localhost:6379`).
//! The tests are ignored by default; run them with
//! `cargo test -p engine-tests -- --ignored`.

use connectors::sql::postgres::utils::connect_client;
use engine_config::{env::EnvManager, loader, settings::Config};
use redis::aio::MultiplexedConnection;
use tokio::sync::{Mutex, MutexGuard};
use tokio_postgres::Client;

pub mod utils;

/// Tests share tables and keys, so they take this lock to run one at a time.
static SERVICES: Mutex<()> = Mutex::const_new(());

async fn exclusive() -> MutexGuard<'static, ()> {
    SERVICES.lock().await
}

/// Loads the worker config from the process environment with `overrides`
/// applied on top, and no delay between iterations.
fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut env = EnvManager::from_process();
    env.set("WORKER_POLL_DELAY", "0s");
    for (key, value) in overrides {
        env.set(key, value);
    }

    let (config, _) = loader::load(None, &env).expect("load test config");
    config
}

async fn pg_client(config: &Config) -> Client {
    let conn_str = config.db.connection_string().expect("connection string");
    connect_client(&conn_str, config.db.root_cert())
        .await
        .expect("connect postgres")
}

async fn redis_connection(config: &Config) -> MultiplexedConnection {
    redis::Client::open(config.redis.connection_url())
        .expect("redis url")
        .get_multiplexed_async_connection()
        .await
        .expect("connect redis")
}
