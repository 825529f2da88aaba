use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

pub mod validated;
pub mod validator;

pub const DEFAULT_SELECT_QUERY: &str =
    "SELECT MAX(id) as id, partition_key FROM sample_table WHERE id > $1 GROUP BY partition_key";

/// Worker configuration as read from YAML and the `WORKER_*` environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub redis: RedisConfig,
    pub db: DbConfig,
    #[serde(with = "humantime_serde")]
    pub poll_delay: Duration,
    pub debug: bool,
    pub batch_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            redis: RedisConfig::default(),
            db: DbConfig::default(),
            poll_delay: Duration::from_secs(2),
            debug: false,
            batch_size: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DbConfig {
    pub connection_string: String,
    pub driver_name: String,
    pub select_query: String,
    pub cursor: CursorConfig,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db_name: String,
    pub tls: DbTlsConfig,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            connection_string: String::new(),
            driver_name: "postgres".to_string(),
            select_query: DEFAULT_SELECT_QUERY.to_string(),
            cursor: CursorConfig::default(),
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            db_name: "postgres".to_string(),
            tls: DbTlsConfig::default(),
        }
    }
}

impl DbConfig {
    /// Returns the explicit connection string, or builds a libpq key/value
    /// string from the individual fields.
    pub fn connection_string(&self) -> Result<String, ConfigError> {
        if !self.connection_string.is_empty() {
            return Ok(self.connection_string.clone());
        }

        if self.driver_name != "postgres" {
            return Err(ConfigError::UnsupportedDriver(self.driver_name.clone()));
        }

        Ok(format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote_conn_value(&self.host),
            self.port,
            quote_conn_value(&self.user),
            quote_conn_value(&self.password),
            quote_conn_value(&self.db_name),
            quote_conn_value(&self.tls.mode),
        ))
    }

    /// PEM root certificate used to verify the server, if configured.
    pub fn root_cert(&self) -> Option<&Path> {
        (!self.tls.root_cert.is_empty()).then(|| Path::new(&self.tls.root_cert))
    }
}

/// Quotes a libpq connection value when it is empty or contains characters
/// that would otherwise split it.
fn quote_conn_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DbTlsConfig {
    pub mode: String,
    pub root_cert: String,
}

impl Default for DbTlsConfig {
    fn default() -> Self {
        DbTlsConfig {
            mode: "disable".to_string(),
            root_cert: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub column: String,
    #[serde(rename = "type")]
    pub cursor_type: String,
    pub default: String,
}

impl Default for CursorConfig {
    fn default() -> Self {
        CursorConfig {
            column: "id".to_string(),
            cursor_type: "int64".to_string(),
            default: "-1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedisConfig {
    pub url: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub tls: RedisTlsConfig,
    pub key: String,
    pub value: String,
    pub cursor_key: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            url: String::new(),
            host: "localhost".to_string(),
            port: 6379,
            user: String::new(),
            password: String::new(),
            tls: RedisTlsConfig::default(),
            key: "my-worker:${partition_key}:key".to_string(),
            value: "${id}".to_string(),
            cursor_key: "my-worker:latest".to_string(),
        }
    }
}

impl RedisConfig {
    /// Returns the explicit URL, or builds one from host, port and
    /// credentials.
    pub fn connection_url(&self) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }

        let auth = match (self.user.is_empty(), self.password.is_empty()) {
            (true, true) => String::new(),
            (false, true) => format!("{}@", self.user),
            (_, false) => format!("{}:{}@", self.user, self.password),
        };

        if self.tls.insecure_skip_verify {
            format!("rediss://{auth}{}:{}/#insecure", self.host, self.port)
        } else {
            format!("redis://{auth}{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedisTlsConfig {
    pub insecure_skip_verify: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_sample_worker() {
        let config = Config::default();
        assert_eq!(config.poll_delay, Duration::from_secs(2));
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.db.select_query, DEFAULT_SELECT_QUERY);
        assert_eq!(config.db.cursor.column, "id");
        assert_eq!(config.db.cursor.cursor_type, "int64");
        assert_eq!(config.db.cursor.default, "-1");
        assert_eq!(config.redis.key, "my-worker:${partition_key}:key");
        assert_eq!(config.redis.value, "${id}");
        assert_eq!(config.redis.cursor_key, "my-worker:latest");
    }

    #[test]
    fn yaml_uses_camel_case_and_fills_gaps_with_defaults() {
        let yaml = r#"
pollDelay: 500ms
batchSize: 10
db:
  selectQuery: "SELECT id FROM uuid_table WHERE id > $1 ORDER BY id"
  dbName: sync
  cursor:
    type: uuid
    default: 00000000-0000-0000-0000-000000000000
  tls:
    rootCert: /etc/ssl/root.pem
redis:
  cursorKey: "worker:latest"
  tls:
    insecureSkipVerify: true
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.poll_delay, Duration::from_millis(500));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.db.db_name, "sync");
        assert_eq!(config.db.cursor.cursor_type, "uuid");
        assert_eq!(config.db.cursor.column, "id");
        assert_eq!(config.db.host, "localhost");
        assert_eq!(config.db.root_cert(), Some(Path::new("/etc/ssl/root.pem")));
        assert_eq!(config.redis.cursor_key, "worker:latest");
        assert!(config.redis.tls.insecure_skip_verify);
        assert_eq!(config.redis.port, 6379);
    }

    #[test]
    fn builds_libpq_connection_string() {
        let db = DbConfig::default();
        assert_eq!(
            db.connection_string().unwrap(),
            "host=localhost port=5432 user=postgres password=postgres dbname=postgres sslmode=disable"
        );
        assert_eq!(db.root_cert(), None);
    }

    #[test]
    fn quotes_connection_values_with_spaces() {
        let db = DbConfig {
            password: "it's secret".to_string(),
            ..DbConfig::default()
        };
        assert!(
            db.connection_string()
                .unwrap()
                .contains("password='it\\'s secret'")
        );
    }

    #[test]
    fn explicit_connection_string_wins() {
        let db = DbConfig {
            connection_string: "postgres://u:p@db/app".to_string(),
            driver_name: "mysql".to_string(),
            ..DbConfig::default()
        };
        assert_eq!(db.connection_string().unwrap(), "postgres://u:p@db/app");
    }

    #[test]
    fn rejects_unknown_driver() {
        let db = DbConfig {
            driver_name: "mysql".to_string(),
            ..DbConfig::default()
        };
        assert!(matches!(
            db.connection_string(),
            Err(ConfigError::UnsupportedDriver(driver)) if driver == "mysql"
        ));
    }

    #[test]
    fn builds_redis_urls() {
        let mut redis = RedisConfig::default();
        assert_eq!(redis.connection_url(), "redis://localhost:6379");

        redis.password = "pw".to_string();
        assert_eq!(redis.connection_url(), "redis://:pw@localhost:6379");

        redis.user = "worker".to_string();
        redis.tls.insecure_skip_verify = true;
        assert_eq!(
            redis.connection_url(),
            "rediss://worker:pw@localhost:6379/#insecure"
        );

        redis.url = "redis://cache:6380/2".to_string();
        assert_eq!(redis.connection_url(), "redis://cache:6380/2");
    }
}
