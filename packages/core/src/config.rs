//! Runtime configuration
//!
//! Read from the environment:
//!
//! - `STATUTE_DB_PATH`: database file (default `~/.statute-book/database/statutes.db`)
//! - `RUST_LOG`: tracing filter (default `info`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const DATABASE_PATH_VAR: &str = "STATUTE_DB_PATH";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot determine home directory; set STATUTE_DB_PATH")]
    NoHomeDirectory,

    #[error("{var} is set but empty")]
    EmptyValue { var: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub log_filter: String,
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup(DATABASE_PATH_VAR) {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::EmptyValue {
                    var: DATABASE_PATH_VAR.to_string(),
                })
            }
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let log_filter = lookup(LOG_FILTER_VAR)
            .filter(|filter| !filter.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            database_path,
            log_filter,
        })
    }
}

/// `~/.statute-book/database/statutes.db`
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home_dir
        .join(".statute-book")
        .join("database")
        .join("statutes.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DATABASE_PATH_VAR, "/tmp/statutes/test.db"),
            (LOG_FILTER_VAR, "statute_core=debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/statutes/test.db"));
        assert_eq!(config.log_filter, "statute_core=debug");
    }

    #[test]
    fn test_defaults() {
        // Only meaningful where a home directory exists
        if dirs::home_dir().is_none() {
            return;
        }
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();

        assert!(config.database_path.ends_with(".statute-book/database/statutes.db"));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(DATABASE_PATH_VAR, "  ")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::EmptyValue {
                var: DATABASE_PATH_VAR.to_string()
            }
        );
    }
}
