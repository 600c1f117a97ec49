// src/config.rs

use crate::constants::*;
use log::info;
use std::{env, path::PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
    /// Keys that fell back to their default, in load order.
    pub defaulted: Vec<(&'static str, &'static str)>,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut defaulted = Vec::new();
        let mut var = |key: &'static str, default: &'static str| {
            let value = lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            match value {
                Some(value) => value,
                None => {
                    defaulted.push((key, default));
                    default.to_string()
                }
            }
        };

        let db_path = PathBuf::from(var(ENV_DB_PATH, DEFAULT_DB_FILE));
        let log_filter = var(ENV_LOG_FILTER, DEFAULT_LOG_FILTER);
        Self {
            db_path,
            log_filter,
            defaulted,
        }
    }

    pub fn with_db_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.db_path = path;
            self.defaulted.retain(|(key, _)| *key != ENV_DB_PATH);
        }
        self
    }

    /// Reports the effective settings. Call once the logger is up.
    pub fn log_summary(&self) {
        for (key, default) in &self.defaulted {
            info!("{key} not set, using default: {default}");
        }
        info!("Database path: {:?}", self.db_path);
        info!("Log filter: {}", self.log_filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let vars: HashMap<&str, &str> = [(ENV_LOG_FILTER, "  ")].into_iter().collect();
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(
            config.defaulted,
            vec![
                (ENV_DB_PATH, DEFAULT_DB_FILE),
                (ENV_LOG_FILTER, DEFAULT_LOG_FILTER)
            ]
        );

        let config = config.with_db_path(Some(PathBuf::from("/tmp/c.db")));
        assert_eq!(config.defaulted, vec![(ENV_LOG_FILTER, DEFAULT_LOG_FILTER)]);
        config.log_summary();
    }

    #[test]
    fn environment_and_flag_override_defaults() {
        let vars: HashMap<&str, &str> = [(ENV_DB_PATH, "/tmp/a.db"), (ENV_LOG_FILTER, "debug")]
            .into_iter()
            .collect();
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.db_path, PathBuf::from("/tmp/a.db"));
        assert_eq!(config.log_filter, "debug");
        assert!(config.defaulted.is_empty());

        let config = config.with_db_path(Some(PathBuf::from("/tmp/b.db")));
        assert_eq!(config.db_path, PathBuf::from("/tmp/b.db"));
    }
}
