//! Runtime configuration, read from an optional TOML file.
//!
//! ```toml
//! database_path = "db.sqlite3"
//! owner = "local"
//! interval_policy = "legacy"   # or "repetition"
//! max_review_attempts = 3
//! clock = "simulated"          # or "system"
//! ```

use crate::clock::ClockMode;
use crate::error::ConfigError;
use crate::models::IntervalPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "db.sqlite3";
pub const DEFAULT_OWNER: &str = "local";
pub const DEFAULT_MAX_REVIEW_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_path: PathBuf,
    pub owner: String,
    pub interval_policy: IntervalPolicy,
    /// Attempts per review before a concurrent-update conflict is surfaced.
    pub max_review_attempts: u32,
    pub clock: ClockMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            owner: DEFAULT_OWNER.to_string(),
            interval_policy: IntervalPolicy::default(),
            max_review_attempts: DEFAULT_MAX_REVIEW_ATTEMPTS,
            clock: ClockMode::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_review_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_review_attempts must be at least 1".to_string(),
            ));
        }
        if self.owner.trim().is_empty() {
            return Err(ConfigError::Invalid("owner must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database_path, PathBuf::from("db.sqlite3"));
        assert_eq!(config.max_review_attempts, 3);
        assert_eq!(config.interval_policy, IntervalPolicy::Legacy);
    }

    #[test]
    fn test_overrides_are_read() {
        let config = Config::from_toml_str(
            r#"
            database_path = "/tmp/concepts.sqlite3"
            owner = "ada"
            interval_policy = "repetition"
            max_review_attempts = 5
            clock = "system"
            "#,
        )
        .unwrap();

        assert_eq!(config.owner, "ada");
        assert_eq!(config.interval_policy, IntervalPolicy::Repetition);
        assert_eq!(config.max_review_attempts, 5);
        assert_eq!(config.clock, ClockMode::System);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let result = Config::from_toml_str("max_review_attempts = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Config::from_toml_str("colour = \"blue\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("no_such_config_xyz123.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
