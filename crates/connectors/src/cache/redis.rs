use crate::error::ConnectorError;
use async_trait::async_trait;
use engine_core::{
    connectors::cache::{CacheStore, Pipeline},
    error::CacheError,
};
use model::core::value::Value;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::debug;

/// Redis-backed [`CacheStore`].
///
/// Pipelines run inside `MULTI`/`EXEC` over a single multiplexed connection,
/// so a batch and its cursor write land together or not at all.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, ConnectorError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(RedisCache { conn })
    }

    pub async fn ping(&self) -> Result<(), ConnectorError> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong != "PONG" {
            return Err(ConnectorError::Ping {
                service: "redis".to_string(),
                response: pong,
            });
        }
        Ok(())
    }
}

/// Queues `SET key value` with the value in its native Redis encoding.
fn queue_set(pipe: &mut redis::Pipeline, key: &str, value: &Value) {
    let cmd = match value {
        Value::Int(v) => pipe.set(key, *v),
        Value::Float(v) => pipe.set(key, *v),
        Value::Boolean(v) => pipe.set(key, *v),
        Value::String(v) => pipe.set(key, v.as_str()),
        other => pipe.set(key, other.as_text()),
    };
    cmd.ignore();
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| CacheError::Read {
            key: key.to_string(),
            source: Box::new(e),
        })?;
        Ok(value)
    }

    async fn exec(&self, pipeline: Pipeline) -> Result<(), CacheError> {
        let ops = pipeline.len();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in pipeline.ops() {
            debug!(key = %op.key, value = %op.value, "Queueing SET");
            queue_set(&mut pipe, &op.key, &op.value);
        }

        let mut conn = self.conn.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Exec {
                ops,
                source: Box::new(e),
            })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_is_wrapped_in_multi_exec() {
        let mut pipe = redis::pipe();
        pipe.atomic();
        queue_set(&mut pipe, "worker:1000:key", &Value::Int(2));
        queue_set(&mut pipe, "my-worker:latest", &Value::from("3"));

        let packed = String::from_utf8(pipe.get_packed_pipeline()).unwrap();
        assert!(packed.starts_with("*1\r\n$5\r\nMULTI\r\n"));
        assert!(packed.contains("worker:1000:key"));
        assert!(packed.contains("my-worker:latest"));
        assert!(packed.trim_end().ends_with("EXEC"));
    }

    #[test]
    fn booleans_are_written_as_digits() {
        let mut pipe = redis::pipe();
        queue_set(&mut pipe, "flag", &Value::Boolean(true));

        let packed = String::from_utf8(pipe.get_packed_pipeline()).unwrap();
        assert!(packed.ends_with("$4\r\nflag\r\n$1\r\n1\r\n"));
    }
}
