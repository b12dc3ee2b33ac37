use crate::api::Timeouts;
use crate::poller::PollConfig;
use crate::retry::RetryPolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `base_url`.
pub const BASE_URL_ENV: &str = "VGEN_BASE_URL";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt of a request.
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 2.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let fallback = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::try_from_secs_f64(self.base_delay_secs)
                .unwrap_or(fallback.base_delay),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/vgen/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VgenConfig {
    /// Prefix every backend endpoint is joined onto.
    pub base_url: String,
    /// Seconds between poll steps.
    pub poll_interval_secs: u64,
    /// Seconds to wait after acceptance before the first poll step.
    pub initial_delay_secs: u64,
    /// Poll steps before giving up.
    pub max_poll_attempts: u32,
    /// Wall-clock ceiling on polling in seconds (None = attempts only).
    pub max_elapsed_secs: Option<u64>,
    /// Timeout for the submission call.
    pub submit_timeout_secs: u64,
    /// Timeout for status queries and other small reads.
    pub status_timeout_secs: u64,
    /// TCP/TLS connect timeout.
    pub connect_timeout_secs: u64,
    /// Typical generation time, used to estimate progress when the backend reports none.
    pub expected_duration_secs: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for VgenConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            poll_interval_secs: 5,
            initial_delay_secs: 2,
            max_poll_attempts: 60,
            max_elapsed_secs: Some(600),
            submit_timeout_secs: 300,
            status_timeout_secs: 10,
            connect_timeout_secs: 15,
            expected_duration_secs: 120,
            retry: None,
        }
    }
}

impl VgenConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryConfig::to_policy)
            .unwrap_or_default()
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            max_attempts: self.max_poll_attempts,
            max_elapsed: self.max_elapsed_secs.map(Duration::from_secs),
            expected_duration: Duration::from_secs(self.expected_duration_secs),
            retry: self.retry_policy(),
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            submit: Duration::from_secs(self.submit_timeout_secs),
            status: Duration::from_secs(self.status_timeout_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Reject values the poller cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_poll_attempts == 0 {
            bail!("max_poll_attempts must be at least 1");
        }
        Ok(())
    }

    /// Apply environment overrides (`VGEN_BASE_URL`).
    pub fn apply_env(&mut self) {
        self.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
    }

    fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(base_url = %url, "base URL overridden from {}", BASE_URL_ENV);
            self.base_url = url.trim().to_string();
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vgen")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
/// Environment overrides are applied on top.
pub fn load_or_init() -> Result<VgenConfig> {
    let mut cfg = load_or_init_at(&config_path()?)?;
    cfg.apply_env();
    Ok(cfg)
}

/// [`load_or_init`] against an explicit path, without environment overrides.
pub fn load_or_init_at(path: &Path) -> Result<VgenConfig> {
    if !path.exists() {
        let default_cfg = VgenConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: VgenConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
