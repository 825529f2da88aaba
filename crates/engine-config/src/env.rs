use crate::error::ConfigError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable snapshot, seeded from the process and optionally
/// extended with `.env` files.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// An empty environment, useful when only explicit values should apply.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load variables from a .env file. Values in the file win over the
    /// snapshot.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::EnvFile(format!("failed to read {}: {}", path.display(), e))
        })?;

        self.parse_env_content(&content)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::EnvFile(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::EnvFile(format!(
                    "empty key at line {}",
                    line_num + 1
                )));
            }

            self.vars
                .insert(key.to_string(), Self::unquote_value(value));
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }

        value.to_string()
    }
}

impl FromIterator<(String, String)> for EnvManager {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_env() {
        let mut env = EnvManager::empty();
        let content = r#"
# Comment
WORKER_BATCH_SIZE=50
export WORKER_DEBUG=true
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("WORKER_BATCH_SIZE"), Some("50"));
        assert_eq!(env.get("WORKER_DEBUG"), Some("true"));
    }

    #[test]
    fn test_parse_quoted_values() {
        let mut env = EnvManager::empty();
        let content = r#"
WORKER_REDIS_KEY="app:${id}:key"
WORKER_DB_SELECT_QUERY='SELECT id FROM t WHERE id > $1'
UNQUOTED=no_spaces
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("WORKER_REDIS_KEY"), Some("app:${id}:key"));
        assert_eq!(
            env.get("WORKER_DB_SELECT_QUERY"),
            Some("SELECT id FROM t WHERE id > $1")
        );
        assert_eq!(env.get("UNQUOTED"), Some("no_spaces"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let mut env = EnvManager::empty();
        env.parse_env_content("WORKER_DB_CONNECTION_STRING=host=db port=5432")
            .unwrap();
        assert_eq!(
            env.get("WORKER_DB_CONNECTION_STRING"),
            Some("host=db port=5432")
        );
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = EnvManager::empty();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }
}
