use crate::error::{ImportError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Upper bound on persistence work for a single record, in seconds.
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: "logs".to_string() }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to
    /// defaults when the file is absent.
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Config::default());
        }
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ImportError::Config(format!("Failed to read config file '{}': {}", config_path, e))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
