//! Client configuration
//!
//! Loaded from JSON. The server generation, database and empty-group policy
//! have no defaults; only the log level does.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::observability::Severity;
use crate::protocol::ServerGeneration;
use crate::response::EmptyGroupPolicy;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings needed to build a client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Server generation: "legacy", "v1" or "vlatest"
    pub generation: ServerGeneration,

    /// Database (file) name
    pub database: String,

    /// Naming of related groups without child records
    pub empty_group_policy: EmptyGroupPolicy,

    /// Minimum log severity (default: "WARN")
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_log_level() -> Severity {
    Severity::Warn
}

impl ClientConfig {
    pub fn new(
        generation: ServerGeneration,
        database: impl Into<String>,
        empty_group_policy: EmptyGroupPolicy,
    ) -> Self {
        Self {
            generation,
            database: database.into(),
            empty_group_policy,
            log_level: default_log_level(),
        }
    }

    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid("database name is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_with_default_log_level() {
        let config = ClientConfig::from_json_str(
            r#"{"generation": "v1", "database": "Shop", "empty_group_policy": "key_as_owner"}"#,
        )
        .unwrap();
        assert_eq!(config.generation, ServerGeneration::V1);
        assert_eq!(config.empty_group_policy, EmptyGroupPolicy::KeyAsOwner);
        assert_eq!(config.log_level, Severity::Warn);
    }

    #[test]
    fn test_policy_is_required() {
        let err = ClientConfig::from_json_str(r#"{"generation": "v1", "database": "Shop"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_empty_database_rejected() {
        let err = ClientConfig::from_json_str(
            r#"{"generation": "legacy", "database": " ", "empty_group_policy": "unresolved"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"generation": "vlatest", "database": "Stock", "empty_group_policy": "key_as_display_name", "log_level": "INFO"}}"#
        )
        .unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.generation, ServerGeneration::VLatest);
        assert_eq!(config.log_level, Severity::Info);
    }

    #[test]
    fn test_missing_file() {
        let err = ClientConfig::load("/nonexistent/dataapi.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
