use crate::{
    env::EnvManager,
    error::ConfigError,
    settings::{Config, validator::validate},
};
use std::{fs, path::Path, str::FromStr, time::Duration};
use tracing::{debug, info};

/// Loads configuration from `path` (if it exists), overlays `WORKER_*`
/// variables from `env`, and validates the result.
///
/// Returns the config together with whether the file was found. A missing
/// file is not an error: environment and defaults still apply.
pub fn load(path: Option<&Path>, env: &EnvManager) -> Result<(Config, bool), ConfigError> {
    let (mut config, file_exists) = match path {
        Some(path) if path.exists() => (read_file(path)?, true),
        Some(path) => {
            info!(path = %path.display(), "Config file not found, using environment and defaults");
            (Config::default(), false)
        }
        None => (Config::default(), false),
    };

    apply_env(&mut config, env)?;
    validate(&mut config)?;

    Ok((config, file_exists))
}

fn read_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    // An empty document deserializes to unit; treat it as all defaults.
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Overlays `WORKER_*` variables onto the file-based config.
fn apply_env(config: &mut Config, env: &EnvManager) -> Result<(), ConfigError> {
    let mut overlay = Overlay { env, applied: 0 };

    overlay.duration("WORKER_POLL_DELAY", &mut config.poll_delay)?;
    overlay.boolean("WORKER_DEBUG", &mut config.debug)?;
    overlay.parsed("WORKER_BATCH_SIZE", &mut config.batch_size)?;

    let db = &mut config.db;
    overlay.string("WORKER_DB_CONNECTION_STRING", &mut db.connection_string);
    overlay.string("WORKER_DB_DRIVER_NAME", &mut db.driver_name);
    overlay.string("WORKER_DB_SELECT_QUERY", &mut db.select_query);
    overlay.string("WORKER_DB_CURSOR_COLUMN", &mut db.cursor.column);
    overlay.string("WORKER_DB_CURSOR_TYPE", &mut db.cursor.cursor_type);
    overlay.string("WORKER_DB_CURSOR_DEFAULT", &mut db.cursor.default);
    overlay.string("WORKER_DB_HOST", &mut db.host);
    overlay.parsed("WORKER_DB_PORT", &mut db.port)?;
    overlay.string("WORKER_DB_USER", &mut db.user);
    overlay.string("WORKER_DB_PASSWORD", &mut db.password);
    overlay.string("WORKER_DB_DBNAME", &mut db.db_name);
    overlay.string("WORKER_DB_TLS_MODE", &mut db.tls.mode);
    overlay.string("WORKER_DB_TLS_ROOTCERT", &mut db.tls.root_cert);

    let redis = &mut config.redis;
    overlay.string("WORKER_REDIS_URL", &mut redis.url);
    overlay.string("WORKER_REDIS_HOST", &mut redis.host);
    overlay.parsed("WORKER_REDIS_PORT", &mut redis.port)?;
    overlay.string("WORKER_REDIS_USER", &mut redis.user);
    overlay.string("WORKER_REDIS_PASSWORD", &mut redis.password);
    overlay.boolean(
        "WORKER_REDIS_TLS_INSECURE_SKIP_VERIFY",
        &mut redis.tls.insecure_skip_verify,
    )?;
    overlay.string("WORKER_REDIS_KEY", &mut redis.key);
    overlay.string("WORKER_REDIS_VALUE", &mut redis.value);
    overlay.string("WORKER_REDIS_CURSOR_KEY", &mut redis.cursor_key);

    debug!(applied = overlay.applied, "Applied environment overrides");
    Ok(())
}

struct Overlay<'a> {
    env: &'a EnvManager,
    applied: usize,
}

impl<'a> Overlay<'a> {
    fn lookup(&mut self, var: &str) -> Option<&'a str> {
        let value = self.env.get(var)?;
        self.applied += 1;
        Some(value)
    }

    fn string(&mut self, var: &str, target: &mut String) {
        if let Some(value) = self.lookup(var) {
            *target = value.to_string();
        }
    }

    fn parsed<T>(&mut self, var: &str, target: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some(value) = self.lookup(var) {
            *target = value
                .trim()
                .parse()
                .map_err(|e: T::Err| invalid_env(var, value, e.to_string()))?;
        }
        Ok(())
    }

    fn boolean(&mut self, var: &str, target: &mut bool) -> Result<(), ConfigError> {
        if let Some(value) = self.lookup(var) {
            *target = parse_bool(value.trim())
                .ok_or_else(|| invalid_env(var, value, "expected a boolean".to_string()))?;
        }
        Ok(())
    }

    fn duration(&mut self, var: &str, target: &mut Duration) -> Result<(), ConfigError> {
        if let Some(value) = self.lookup(var) {
            *target = humantime::parse_duration(value.trim())
                .map_err(|e| invalid_env(var, value, e.to_string()))?;
        }
        Ok(())
    }
}

/// Accepts the usual spellings: `1/0`, `t/f`, `true/false` in any case.
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

fn invalid_env(var: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
        reason,
    }
}
