//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. Optional config file (TOML / JSON / YAML, picked by extension)
//! 3. Environment variables, e.g. `SMARTMARKET_API__BASE_URL`

#![allow(clippy::derivable_impls)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::session::DEFAULT_TOKEN_KEY;

pub const ENV_PREFIX: &str = "SMARTMARKET";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Built-in defaults
pub mod defaults {
    pub const API_BASE_URL: &str = "http://localhost:8000";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Give the backend job time to start before the first poll
    pub const POLL_INITIAL_DELAY_MS: u64 = 3000;
    pub const POLL_INTERVAL_MS: u64 = 2000;
    pub const POLL_MAX_ATTEMPTS: u32 = 30;

    pub const RECENT_LIMIT: usize = 6;
    pub const HEALTH_INTERVAL_SECONDS: u64 = 10;
    pub const DEFAULT_PLATFORM: &str = "amazon";

    pub const LOG_LEVEL: &str = "warn";
    pub const LOG_FILE_NAME: &str = "smartmarket.log";
    pub const LOG_ROTATION: &str = "daily";
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub recent: RecentConfig,
    pub health: HealthConfig,
    pub analysis: AnalysisConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL; trailing slashes are ignored
    pub base_url: String,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
}

/// Poll schedule for analysis results. The timeout is attempt based:
/// `initial_delay + interval × (max_attempts - 1)` of waiting at most.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl PollingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentConfig {
    /// How many recent analyses to keep
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConfig {
    pub interval_seconds: u64,
}

impl HealthConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Platform hint sent with URL submissions when the caller gives none
    pub default_platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub token_key: String,
    /// Session file; the user data directory is used when unset
    pub file: Option<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// "error", "warn", "info", "debug", "trace"
    pub level: String,
    pub json_format: bool,
    /// Console output goes to stderr so command output stays clean
    pub console_output: bool,
    pub file_output: bool,
    /// Log directory; `<data_local_dir>/smartmarket/logs` when unset
    pub log_dir: Option<String>,
    pub file_name: String,
    /// "daily", "hourly" or "never"
    pub rotation: String,
    /// Per-target levels, e.g. "reqwest" = "warn"
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            polling: PollingConfig::default(),
            recent: RecentConfig::default(),
            health: HealthConfig::default(),
            analysis: AnalysisConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_BASE_URL.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: concat!("smartmarket-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: defaults::POLL_INITIAL_DELAY_MS,
            interval_ms: defaults::POLL_INTERVAL_MS,
            max_attempts: defaults::POLL_MAX_ATTEMPTS,
        }
    }
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            limit: defaults::RECENT_LIMIT,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_seconds: defaults::HEALTH_INTERVAL_SECONDS,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_platform: defaults::DEFAULT_PLATFORM.to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            rotation: defaults::LOG_ROTATION.to_string(),
            module_filters: HashMap::from([
                ("reqwest".to_string(), "warn".to_string()),
                ("hyper".to_string(), "warn".to_string()),
                ("h2".to_string(), "warn".to_string()),
                ("tokio".to_string(), "info".to_string()),
            ]),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Validation {
                message: "api.base_url must not be empty".to_string(),
            });
        }
        match url::Url::parse(base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {}
            _ => {
                return Err(ConfigError::Validation {
                    message: format!("api.base_url is not an absolute http(s) URL: {base_url}"),
                });
            }
        }

        if self.polling.max_attempts == 0 {
            return Err(ConfigError::Validation {
                message: "polling.max_attempts must be greater than 0".to_string(),
            });
        }
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Validation {
                message: "polling.interval_ms must be greater than 0".to_string(),
            });
        }
        if self.recent.limit == 0 {
            return Err(ConfigError::Validation {
                message: "recent.limit must be greater than 0".to_string(),
            });
        }
        if self.health.interval_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "health.interval_seconds must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration manager for loading settings
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    pub config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Directory holding the default config file
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("smartmarket"))
    }

    /// Manager reading `<config_dir>/smartmarket/config.toml` if it exists
    pub fn new() -> Self {
        Self {
            config_path: Self::get_config_dir().map(|dir| dir.join("config.toml")),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        self.load_with_env(None)
    }

    /// `env` replaces the process environment as the variable source when given
    pub fn load_with_env(
        &self,
        env: Option<HashMap<String, String>>,
    ) -> Result<AppConfig, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = &self.config_path {
            debug!("Looking for configuration file at {:?}", path);
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!("✅ Configuration loaded (api: {})", config.api.base_url);
        Ok(config)
    }
}
