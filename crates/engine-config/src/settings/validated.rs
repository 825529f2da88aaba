use crate::{error::ConfigError, settings::Config};
use engine_core::retry::BackoffPolicy;
use model::{pagination::cursor::CursorDescriptor, projection::template::Template};
use std::time::Duration;
use tracing::info;

/// Immutable, validated settings consumed by the sync loop.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Select query with the batch limit already appended
    pub select_query: String,
    /// Cache key holding the persisted cursor
    pub cursor_key: String,
    /// Delay between successful iterations
    pub poll_delay: Duration,
    pub batch_size: usize,
    pub cursor: CursorDescriptor,
    /// Projection of a row into its cache key
    pub key: Template,
    /// Projection of a row into its cache value
    pub value: Template,
    pub backoff: BackoffPolicy,
    /// Stop cleanly after this many iterations. `None` runs until cancelled.
    pub max_iterations: Option<u64>,
}

impl SyncSettings {
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}

impl Config {
    /// Compiles the cursor descriptor and projection templates.
    ///
    /// Expects a config that already passed [`super::validator::validate`].
    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        let cursor = CursorDescriptor::new(
            &self.db.cursor.column,
            &self.db.cursor.cursor_type,
            &self.db.cursor.default,
        )?;

        let key = Template::compile(&self.redis.key)?;
        info!(key = %key, columns = ?key.columns(), "Using redis key");

        let value = Template::compile(&self.redis.value)?;
        info!(value = %value, columns = ?value.columns(), "Using redis value");

        let batch_size = usize::try_from(self.batch_size).map_err(|_| {
            ConfigError::Invalid(format!("batch size out of range: {}", self.batch_size))
        })?;

        Ok(SyncSettings {
            select_query: self.db.select_query.clone(),
            cursor_key: self.redis.cursor_key.clone(),
            poll_delay: self.poll_delay,
            batch_size,
            cursor,
            key,
            value,
            backoff: BackoffPolicy::default(),
            max_iterations: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{core::value::Value, error::CursorError, pagination::cursor::CursorType};
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn compiles_default_settings() {
        let settings = Config::default().sync_settings().unwrap();

        assert_eq!(settings.cursor.column, "id");
        assert_eq!(settings.cursor.cursor_type, CursorType::Int64);
        assert_eq!(settings.cursor.default, Value::Int(-1));
        assert_eq!(settings.key.columns(), ["partition_key"]);
        assert!(settings.value.is_passthrough());
        assert_eq!(settings.batch_size, 200);
        assert_eq!(settings.max_iterations, None);
        assert!(logs_contain("Using redis key"));
    }

    #[test]
    fn bad_cursor_default_is_a_config_error() {
        let mut config = Config::default();
        config.db.cursor.default = "not-a-number".to_string();

        assert!(matches!(
            config.sync_settings(),
            Err(ConfigError::Cursor(CursorError::Conversion { .. }))
        ));
    }

    #[test]
    fn template_without_placeholders_is_rejected() {
        let mut config = Config::default();
        config.redis.key = "static-key".to_string();

        assert!(matches!(
            config.sync_settings(),
            Err(ConfigError::Template(_))
        ));
    }
}
