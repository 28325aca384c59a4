//! Monitor runtime configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vault_monitor_chain::AccountId;

use super::env::{self, expand_env};
use crate::error::MonitorError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Main configuration structure for the withdrawal monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Vault to monitor (32-byte hex)
    #[serde(default)]
    pub vault_address: String,

    /// Base URL of the vault state gateway
    #[serde(default)]
    pub state_api_url: String,

    /// Seconds between cycle starts
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Consecutive failed cycles tolerated before exiting (1 = first failure is fatal)
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,

    /// Watchdog for a single cycle (seconds); no watchdog when unset
    #[serde(default)]
    pub cycle_timeout_secs: Option<u64>,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_interval() -> u64 {
    60
}
fn default_max_failures() -> u32 {
    1
}
fn default_request_timeout() -> u64 {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            vault_address: String::new(),
            state_api_url: String::new(),
            interval_secs: default_interval(),
            max_consecutive_failures: default_max_failures(),
            cycle_timeout_secs: None,
            request_timeout_secs: default_request_timeout(),
            log_format: LogFormat::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MonitorError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MonitorError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text, expanding `${VAR}` references.
    pub fn from_toml(content: &str) -> Result<Self, MonitorError> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| MonitorError::configuration(format!("invalid config file: {}", e)))?;
        config.expand_env_vars();
        Ok(config)
    }

    /// Load from `MONITOR_CONFIG` (if set), apply environment overrides and validate.
    pub fn load() -> Result<Self, MonitorError> {
        let mut config = match std::env::var(env::CONFIG_PATH) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Expand ${VAR_NAME} patterns in string settings.
    pub fn expand_env_vars(&mut self) {
        self.vault_address = expand_env(&self.vault_address);
        self.state_api_url = expand_env(&self.state_api_url);
    }

    /// Override settings from environment variables, read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), MonitorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(vault) = lookup(env::VAULT_ADDRESS) {
            self.vault_address = vault;
        }
        if let Some(url) = lookup(env::STATE_API_URL) {
            self.state_api_url = url;
        }
        if let Some(secs) = lookup(env::INTERVAL_SECS) {
            self.interval_secs = parse_number(env::INTERVAL_SECS, &secs)?;
        }
        if let Some(failures) = lookup(env::MAX_FAILURES) {
            self.max_consecutive_failures = parse_number(env::MAX_FAILURES, &failures)?;
        }
        if let Some(secs) = lookup(env::CYCLE_TIMEOUT_SECS) {
            self.cycle_timeout_secs = Some(parse_number(env::CYCLE_TIMEOUT_SECS, &secs)?);
        }
        if let Some(format) = lookup(env::LOG_FORMAT) {
            self.log_format = LogFormat::parse(&format).ok_or_else(|| {
                MonitorError::configuration(format!("{} must be 'text' or 'json'", env::LOG_FORMAT))
            })?;
        }
        Ok(())
    }

    /// Check that every required setting is present and sane.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.vault_address.trim().is_empty() {
            return Err(MonitorError::configuration(format!(
                "must set {}",
                env::VAULT_ADDRESS
            )));
        }
        self.vault()?;

        let url = self.state_api_url.trim();
        if url.is_empty() {
            return Err(MonitorError::configuration(format!(
                "must set {}",
                env::STATE_API_URL
            )));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MonitorError::configuration(format!(
                "{} must be an http(s) URL, got '{}'",
                env::STATE_API_URL,
                url
            )));
        }

        if self.interval_secs == 0 {
            return Err(MonitorError::configuration("interval_secs must be positive"));
        }
        if self.max_consecutive_failures == 0 {
            return Err(MonitorError::configuration(
                "max_consecutive_failures must be at least 1",
            ));
        }
        if self.cycle_timeout_secs == Some(0) {
            return Err(MonitorError::configuration("cycle_timeout_secs must be positive"));
        }
        if self.request_timeout_secs == 0 {
            return Err(MonitorError::configuration("request_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Parsed vault identity.
    pub fn vault(&self) -> Result<AccountId, MonitorError> {
        self.vault_address
            .parse()
            .map_err(MonitorError::Configuration)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Option<Duration> {
        self.cycle_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(
            vault = %self.vault_address,
            state_api_url = %self.state_api_url,
            "Monitor configuration loaded"
        );
        tracing::info!(
            interval_secs = self.interval_secs,
            max_consecutive_failures = self.max_consecutive_failures,
            cycle_timeout_secs = ?self.cycle_timeout_secs,
            request_timeout_secs = self.request_timeout_secs,
            "Monitor timing"
        );
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, MonitorError> {
    value.trim().parse().map_err(|_| {
        MonitorError::configuration(format!("{} must be a non-negative integer, got '{}'", name, value))
    })
}
