//! Configuration value object and loader (A1).
//!
//! A concrete, validated struct rather than an ambient global — construction
//! goes through `Config::load_from_path`/`Config::from_value`, both of which
//! run `validate` before returning.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub error_file: PathBuf,
    pub log_file: PathBuf,
    pub id_key: String,
    #[serde(default)]
    pub rerun_key: Option<String>,
    pub max_concurrency: u32,
    pub requests_per_minute: i64,
    pub write_batch_size: usize,
    pub max_retries: u32,
    pub retry_initial_delay: f64,
    pub retry_backoff_factor: f64,
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Config {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        Self::from_value(value, &path.display().to_string())
    }

    pub fn from_value(value: serde_json::Value, source_label: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_value(value).map_err(|source| ConfigError::Parse {
                path: source_label.to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be >= 1".into()));
        }
        if self.requests_per_minute < 0 {
            return Err(ConfigError::Invalid(
                "requests_per_minute must be >= 0".into(),
            ));
        }
        if self.write_batch_size == 0 {
            return Err(ConfigError::Invalid("write_batch_size must be >= 1".into()));
        }
        if self.retry_initial_delay <= 0.0 {
            return Err(ConfigError::Invalid(
                "retry_initial_delay must be > 0".into(),
            ));
        }
        if self.retry_backoff_factor <= 1.0 {
            return Err(ConfigError::Invalid(
                "retry_backoff_factor must be > 1".into(),
            ));
        }
        if self.id_key.is_empty() {
            return Err(ConfigError::Invalid("id_key must not be empty".into()));
        }

        Ok(())
    }

    /// Apply `BATCHCTL_`-prefixed environment variable overrides for the
    /// handful of fields worth tweaking without editing the config file.
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var("BATCHCTL_MAX_CONCURRENCY") {
            self.max_concurrency = v
                .parse()
                .map_err(|_| ConfigError::Invalid("BATCHCTL_MAX_CONCURRENCY must be an integer".into()))?;
        }
        if let Ok(v) = std::env::var("BATCHCTL_REQUESTS_PER_MINUTE") {
            self.requests_per_minute = v.parse().map_err(|_| {
                ConfigError::Invalid("BATCHCTL_REQUESTS_PER_MINUTE must be an integer".into())
            })?;
        }
        if let Ok(v) = std::env::var("BATCHCTL_WRITE_BATCH_SIZE") {
            self.write_batch_size = v
                .parse()
                .map_err(|_| ConfigError::Invalid("BATCHCTL_WRITE_BATCH_SIZE must be an integer".into()))?;
        }

        self.validate()?;
        Ok(self)
    }
}
