use crate::{error::ConfigError, settings::Config};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

lazy_static! {
    static ref LIMIT_CLAUSE: Regex = Regex::new(r"(?i)\bLIMIT\s+\d+").expect("valid limit regex");
}

/// Checks the loaded configuration and appends the batch limit to the
/// select query. Must run exactly once per loaded config.
pub fn validate(config: &mut Config) -> Result<(), ConfigError> {
    if LIMIT_CLAUSE.is_match(&config.db.select_query) {
        return Err(ConfigError::Invalid(
            "select query should not contain LIMIT".to_string(),
        ));
    }

    if config.batch_size <= 0 {
        return Err(ConfigError::Invalid(
            "batch size should be greater than 0".to_string(),
        ));
    }

    if config.batch_size > 100_000 {
        warn!(
            batch_size = config.batch_size,
            "Batch size is very large, a single commit may be slow"
        );
    }

    config.db.select_query = format!("{} LIMIT {}", config.db.select_query, config.batch_size);
    info!(query = %config.db.select_query, "Using select query");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_SELECT_QUERY;

    #[test]
    fn appends_batch_limit() {
        let mut config = Config::default();
        validate(&mut config).unwrap();
        assert_eq!(
            config.db.select_query,
            format!("{DEFAULT_SELECT_QUERY} LIMIT 200")
        );
    }

    #[test]
    fn rejects_query_with_limit_in_any_case() {
        for query in [
            "SELECT id FROM t WHERE id > $1 LIMIT 10",
            "select id from t where id > $1 limit\n5",
        ] {
            let mut config = Config::default();
            config.db.select_query = query.to_string();
            assert!(matches!(validate(&mut config), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn limit_inside_identifier_is_allowed() {
        let mut config = Config::default();
        config.db.select_query = "SELECT id, nolimit FROM t WHERE id > $1".to_string();
        config.batch_size = 3;
        validate(&mut config).unwrap();
        assert!(config.db.select_query.ends_with(" LIMIT 3"));
    }

    #[test]
    fn rejects_non_positive_batch_size() {
        for batch_size in [0, -5] {
            let mut config = Config::default();
            config.batch_size = batch_size;
            assert!(matches!(validate(&mut config), Err(ConfigError::Invalid(_))));
        }
    }
}
