//! Client configuration
//!
//! Loaded from YAML; every field has a default so an empty file is valid.
//! Secrets come from the environment (`.env` is honoured).

use crate::domain::{
    DEFAULT_SOCKET_URL, EVENT_AUTO_MODE_UPDATED, EVENT_COMPETITION_UPDATED, EVENT_TABLE_UPDATED,
};
use hyperrpc::states::HasUrl;
use hyperrpc::{FixedDelay, ProbeConfig, RpcClientBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const ENV_SOCKET_URL: &str = "PWB_SOCKET_URL";
pub const ENV_TOKEN: &str = "PWB_TOKEN";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarMissing(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_socket_url")]
    pub socket_url: String,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub transport: TransportSettings,

    #[serde(default)]
    pub rpc: RpcSettings,

    #[serde(default)]
    pub buffer: BufferSettings,

    #[serde(default)]
    pub probe: ProbeSettings,

    /// Auth token from .env (not in YAML)
    #[serde(skip)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Pause before reconnecting after a non-manual close
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSettings {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Payloads containing any of these strings are not logged
    #[serde(default = "default_log_suppress")]
    pub log_suppress: Vec<String>,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            log_suppress: default_log_suppress(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferSettings {
    /// Pause between releases of buffered notifications
    #[serde(default = "default_drain_delay_ms")]
    pub drain_delay_ms: u64,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            drain_delay_ms: default_drain_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    #[serde(default = "default_fast_interval_ms")]
    pub fast_interval_ms: u64,
    #[serde(default = "default_normal_interval_ms")]
    pub normal_interval_ms: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_slow_threshold_ms")]
    pub slow_threshold_ms: u64,
    #[serde(default = "default_offset_noise_ms")]
    pub offset_noise_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            fast_interval_ms: default_fast_interval_ms(),
            normal_interval_ms: default_normal_interval_ms(),
            timeout_ms: default_probe_timeout_ms(),
            slow_threshold_ms: default_slow_threshold_ms(),
            offset_noise_ms: default_offset_noise_ms(),
        }
    }
}

impl ProbeSettings {
    pub fn to_probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            fast_interval: Duration::from_millis(self.fast_interval_ms),
            normal_interval: Duration::from_millis(self.normal_interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
            slow_threshold: Duration::from_millis(self.slow_threshold_ms),
            offset_noise: Duration::from_millis(self.offset_noise_ms),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            socket_url: default_socket_url(),
            log_level: default_log_level(),
            transport: TransportSettings::default(),
            rpc: RpcSettings::default(),
            buffer: BufferSettings::default(),
            probe: ProbeSettings::default(),
            token: None,
        }
    }
}

impl ClientSettings {
    /// Load configuration from a YAML file, then apply environment overrides
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: ClientSettings = serde_yaml::from_str(&yaml_content)?;

        // Load .env file (ignore if missing)
        dotenv::dotenv().ok();
        config.apply_env();

        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_SOCKET_URL) {
            if !url.is_empty() {
                info!("Overriding socket URL from environment variable");
                self.socket_url = url;
            }
        }
        self.token = std::env::var(ENV_TOKEN).ok().filter(|t| !t.is_empty());
    }

    /// Auth token, required by binaries that authenticate
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing(ENV_TOKEN.to_string()))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.socket_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "socket_url cannot be empty".to_string(),
            ));
        }
        if !(self.socket_url.starts_with("ws://") || self.socket_url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "socket_url must start with ws:// or wss://, got '{}'",
                self.socket_url
            )));
        }

        let durations = [
            ("transport.reconnect_delay_ms", self.transport.reconnect_delay_ms),
            ("rpc.request_timeout_ms", self.rpc.request_timeout_ms),
            ("buffer.drain_delay_ms", self.buffer.drain_delay_ms),
            ("probe.fast_interval_ms", self.probe.fast_interval_ms),
            ("probe.normal_interval_ms", self.probe.normal_interval_ms),
            ("probe.timeout_ms", self.probe.timeout_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Builder for an RPC client with the PWB notification streams declared
    ///
    /// Competition and table updates are buffered and released in serial
    /// order; auto-mode updates are delivered as they arrive.
    pub fn client_builder(&self) -> RpcClientBuilder<HasUrl> {
        hyperrpc::builder()
            .url(self.socket_url.clone())
            .reconnect_strategy(FixedDelay::new(
                Duration::from_millis(self.transport.reconnect_delay_ms),
                None,
            ))
            .request_timeout(Duration::from_millis(self.rpc.request_timeout_ms))
            .drain_delay(Duration::from_millis(self.buffer.drain_delay_ms))
            .log_suppress(self.rpc.log_suppress.clone())
            .probe(self.probe.to_probe_config())
            .buffered_stream(EVENT_COMPETITION_UPDATED)
            .buffered_stream(EVENT_TABLE_UPDATED)
            .immediate_stream(EVENT_AUTO_MODE_UPDATED)
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Socket URL: {}", self.socket_url);
        info!("  Log level: {}", self.log_level);
        info!("  Reconnect delay: {}ms", self.transport.reconnect_delay_ms);
        info!("  Request timeout: {}ms", self.rpc.request_timeout_ms);
        info!("  Drain delay: {}ms", self.buffer.drain_delay_ms);
        info!(
            "  Probe: fast {}ms / normal {}ms / timeout {}ms",
            self.probe.fast_interval_ms, self.probe.normal_interval_ms, self.probe.timeout_ms
        );
        info!("  Token: {}", if self.token.is_some() { "set" } else { "not set" });
    }
}

fn default_socket_url() -> String {
    DEFAULT_SOCKET_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_log_suppress() -> Vec<String> {
    vec![
        "System.DeepPing".to_string(),
        "\"result\":{\"client_timestamp\":".to_string(),
    ]
}

fn default_drain_delay_ms() -> u64 {
    10
}

fn default_fast_interval_ms() -> u64 {
    1000
}

fn default_normal_interval_ms() -> u64 {
    3000
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

fn default_slow_threshold_ms() -> u64 {
    250
}

fn default_offset_noise_ms() -> u64 {
    1000
}
