//! Configuration management
//!
//! Layered as: built-in defaults, then an optional TOML file, then
//! `AUTOREPLY_*` environment variables (`__` separates sections, e.g.
//! `AUTOREPLY_SERVER__PORT=3001`).

use crate::application::responder::DEFAULT_FALLBACK_TEXT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "AUTOREPLY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "autoreply.toml";
const ENV_PREFIX: &str = "AUTOREPLY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
    pub responder: ResponderConfig,
    pub logging: LoggingConfig,
}

/// Pairing/status HTTP server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

/// WebSocket bridge to the messaging gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub url: String,
    pub send_timeout_ms: u64,
    pub event_buffer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub auth_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderConfig {
    pub audio_path: String,
    pub audio_mimetype: String,
    pub fallback_text: String,
    pub settle_delay_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765".to_string(),
            send_timeout_ms: 30_000,
            event_buffer: 256,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_dir: "./auth".to_string(),
        }
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            audio_path: "./auto_response.mp3".to_string(),
            audio_mimetype: "audio/mp4".to_string(),
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            settle_delay_ms: 1000,
            max_attempts: 3,
            backoff_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (missing file is fine) and the environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `AUTOREPLY_CONFIG`, or `autoreply.toml`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.responder.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "responder.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.responder.fallback_text.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "responder.fallback_text must not be empty".to_string(),
            ));
        }
        if self.gateway.url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.url must not be empty".to_string()));
        }
        if self.gateway.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "gateway.event_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
