//! Configuration management for sedline
//!
//! sedline reads optional defaults from ~/.sedline/config.toml. Command-line
//! flags always win over values found here.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Widest accepted wrap width for auto-printed lines
pub const MAX_LINE_WRAP: usize = 4096;

/// sedline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Processing settings
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Wrap auto-printed lines at this width (0 = never wrap)
    #[serde(default)]
    pub line_wrap: usize,

    /// Suppress the automatic print by default
    #[serde(default)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a debug log to ~/.sedline/sedline.log
    #[serde(default)]
    pub debug: bool,
}

/// Directory holding the config file and the debug log
pub fn config_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".sedline"))
}

/// Get the configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load configuration from the default location.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    if config.processing.line_wrap > MAX_LINE_WRAP {
        anyhow::bail!(
            "Invalid line_wrap: {} (max {})",
            config.processing.line_wrap,
            MAX_LINE_WRAP
        );
    }
    Ok(())
}
