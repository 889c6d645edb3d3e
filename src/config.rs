//! Configuration file for the stepboard service.
//!
//! Every field is required except `checklist_step_id` and `allowed_origins`.

use crate::cache::poller::PollIntervals;
use axum::http::HeaderValue;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "STEPBOARD_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub remote_base_url: String,
    pub listen_addr: SocketAddr,
    pub request_timeout_ms: u64,
    /// Offset used for "today" and for result timestamps; schedule dates are never shifted.
    pub display_utc_offset_hours: i32,
    pub session_path: PathBuf,
    #[serde(default)]
    pub checklist_step_id: Option<i64>,
    /// Browser origins allowed to call the service, e.g. `http://localhost:5173`.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    pub units_ms: u64,
    pub schedule_ms: u64,
    pub tester_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or STEPBOARD_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.remote_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "remote_base_url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if !(-12..=14).contains(&self.display_utc_offset_hours) {
            return Err(ConfigError::InvalidValue {
                field: "display_utc_offset_hours",
                reason: "must be between -12 and 14".to_string(),
            });
        }
        if self.session_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session_path",
                reason: "must not be empty".to_string(),
            });
        }
        for origin in &self.allowed_origins {
            let valid = (origin.starts_with("http://") || origin.starts_with("https://"))
                && !origin.ends_with('/')
                && HeaderValue::from_str(origin).is_ok();
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: "allowed_origins",
                    reason: format!("{} is not an origin like https://host:port", origin),
                });
            }
        }
        for (field, value) in [
            ("polling.units_ms", self.polling.units_ms),
            ("polling.schedule_ms", self.polling.schedule_ms),
            ("polling.tester_ms", self.polling.tester_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be > 0".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn cors_origins(&self) -> Vec<HeaderValue> {
        self.allowed_origins
            .iter()
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }

    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            units: Duration::from_millis(self.polling.units_ms),
            schedule: Duration::from_millis(self.polling.schedule_ms),
            tester: Duration::from_millis(self.polling.tester_ms),
        }
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV).map(PathBuf::from)
}
