//! Application Configuration
//!
//! Built-in defaults, overlaid by an optional TOML file, overlaid by
//! `AURORA__`-prefixed environment variables (`AURORA__SERVER__BIND=...`).

use config::{Config, ConfigError, Environment, File};
use feed_client::CmeFeedConfig;
use forecast::{ForecastThresholds, StormConfig};
use pipeline::FeedsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use storage::DatabaseConfig;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "aurora-watch";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "AURORA";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub feeds: FeedsConfig,
    pub cme: CmeFeedConfig,
    pub storm: StormConfig,
    pub forecast: ForecastThresholds,
}

impl AppConfig {
    /// Load configuration
    ///
    /// An explicit `path` must exist; otherwise `aurora-watch.toml` is read
    /// from the working directory if present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
