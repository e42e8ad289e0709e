//! Server configuration.
//!
//! Values come from an optional JSON file named by `SURVEY_CONFIG`, then
//! individual environment variables override single fields.
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value `{value}` for {key}: {message}")]
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub address: String,
    pub port: u16,
    /// Path of the SQLite workbook file
    pub db_path: String,
    /// Keep the workbook in memory instead of on disk
    pub in_memory: bool,
    /// Compare-and-set attempts per vote before giving up
    pub vote_retry_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
            db_path: "survey_board.sqlite3".to_string(),
            in_memory: false,
            vote_retry_limit: 5,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup("SURVEY_CONFIG") {
            Some(path) => {
                info!("Loading config from {}", path);
                Self::from_file(&path)?
            }
            None => {
                info!("SURVEY_CONFIG not set, using defaults");
                Self::default()
            }
        };

        override_from(&lookup, "SURVEY_ADDRESS", &mut config.address)?;
        override_from(&lookup, "SURVEY_PORT", &mut config.port)?;
        override_from(&lookup, "SURVEY_DB_PATH", &mut config.db_path)?;
        override_from(&lookup, "SURVEY_IN_MEMORY", &mut config.in_memory)?;
        override_from(&lookup, "SURVEY_VOTE_RETRY_LIMIT", &mut config.vote_retry_limit)?;

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

fn override_from<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    field: &mut T,
) -> Result<(), ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = lookup(key) else {
        return Ok(());
    };

    *field = value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        value: value.clone(),
        message: e.to_string(),
    })?;
    info!("{} set from environment", key);

    Ok(())
}
