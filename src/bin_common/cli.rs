//! CLI utilities for binaries
//!
//! Resolves the configuration path and loads client settings.

use pwb::config::{ClientSettings, ConfigError};
use std::path::PathBuf;
use tracing::warn;

/// Which configuration file to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Client configuration (config.yaml)
    Client,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Client => "config.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        "CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
///
/// A custom path always wins over the environment.
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    if let ConfigType::Custom(path) = &config_type {
        return PathBuf::from(path);
    }
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Load client settings from the resolved path
///
/// A missing file falls back to defaults plus environment overrides; a
/// file that exists but does not parse or validate is an error.
pub fn load_settings(config_type: ConfigType) -> Result<ClientSettings, ConfigError> {
    let path = load_config_from_env(config_type);
    if path.exists() {
        ClientSettings::load(&path)
    } else {
        warn!("Config file {} not found, using defaults", path.display());
        ClientSettings::from_env()
    }
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
