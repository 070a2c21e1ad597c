//! Configuration for counting runs.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with `QFAULT_` prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CountError, CountingResult};

/// Complete run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool, chunking and memoisation.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the [`RuntimeContext`](crate::runtime::RuntimeContext).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of worker threads. `0` runs everything on the calling thread.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Number of count entries per convolution task.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Reuse results of identical sub-computations within one run.
    #[serde(default = "default_true")]
    pub memoize: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_workers() -> usize {
    0
}

fn default_chunk_size() -> usize {
    4096
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            workers: default_workers(),
            chunk_size: default_chunk_size(),
            memoize: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CountingResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(contents: &str) -> CountingResult<Self> {
        let config: Config = serde_yaml_ng::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Config::default().merge_env()
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&str>) -> CountingResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Only variables that are set and parse override the current values.
    fn merge_env(mut self) -> Self {
        if let Some(val) = env_parse("QFAULT_WORKERS") {
            self.runtime.workers = val;
        }
        if let Some(val) = env_parse("QFAULT_CHUNK_SIZE") {
            self.runtime.chunk_size = val;
        }
        if let Some(val) = env_parse("QFAULT_MEMOIZE") {
            self.runtime.memoize = val;
        }

        if let Ok(v) = std::env::var("QFAULT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("QFAULT_LOG_FORMAT") {
            self.logging.format = v;
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> CountingResult<()> {
        if self.runtime.chunk_size == 0 {
            return Err(CountError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(CountError::Config(format!("Invalid log level: {other}")));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(CountError::Config(format!("Invalid log format: {other}")));
            }
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
