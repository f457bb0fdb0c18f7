use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Overrides `backend.url` when set (also read from `.env`)
pub const BACKEND_URL_ENV: &str = "STEAMLORD_BACKEND_URL";

/// Setting names accepted by `settings get|set|reset`
pub const SETTING_NAMES: &[&str] = &[
    "backend-url",
    "request-timeout-secs",
    "reconcile-period-ms",
    "game-poll-ms",
    "fix-apply-poll-ms",
    "fix-remove-poll-ms",
    "bypass-poll-ms",
    "ignore-window-secs",
    "ignore-capacity",
    "license-wait-ms",
    "license-step-ms",
    "validate-delay-ms",
    "retry-max-attempts",
    "retry-base-delay-ms",
    "retry-max-delay-ms",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:9321/steamlord".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Periods and windows of the task coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub reconcile_period_ms: u64,
    pub game_poll_ms: u64,
    pub fix_apply_poll_ms: u64,
    pub fix_remove_poll_ms: u64,
    pub bypass_poll_ms: u64,
    pub ignore_window_secs: u64,
    pub ignore_capacity: usize,
    pub license_wait_ms: u64,
    pub license_step_ms: u64,
    pub validate_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reconcile_period_ms: 1000,
            game_poll_ms: 1000,
            fix_apply_poll_ms: 500,
            fix_remove_poll_ms: 1000,
            bypass_poll_ms: 1000,
            ignore_window_secs: 30,
            ignore_capacity: 20,
            license_wait_ms: 5000,
            license_step_ms: 100,
            validate_delay_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn reconcile_period(&self) -> Duration {
        Duration::from_millis(self.reconcile_period_ms)
    }

    pub fn ignore_window(&self) -> Duration {
        Duration::from_secs(self.ignore_window_secs)
    }

    pub fn license_wait(&self) -> Duration {
        Duration::from_millis(self.license_wait_ms)
    }

    pub fn license_step(&self) -> Duration {
        Duration::from_millis(self.license_step_ms)
    }

    pub fn validate_delay(&self) -> Duration {
        Duration::from_millis(self.validate_delay_ms)
    }
}

/// Retry policy for discovery lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("steamlord-taskman")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".steamlord-taskman")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Effective configuration: the file plus environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// The file alone; use this before `save` so overrides are not persisted
    pub fn load_file() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
        Self::parse(&config_content).with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        debug!("Saving config to: {:?}", config_path);

        let config_content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                debug!("Backend URL overridden by {}", BACKEND_URL_ENV);
                self.backend.url = url.trim().to_string();
            }
        }
    }

    /// Current value of a named setting
    pub fn get_setting(&self, name: &str) -> Result<String> {
        let t = &self.timing;
        let value = match name {
            "backend-url" => self.backend.url.clone(),
            "request-timeout-secs" => self.backend.request_timeout_secs.to_string(),
            "reconcile-period-ms" => t.reconcile_period_ms.to_string(),
            "game-poll-ms" => t.game_poll_ms.to_string(),
            "fix-apply-poll-ms" => t.fix_apply_poll_ms.to_string(),
            "fix-remove-poll-ms" => t.fix_remove_poll_ms.to_string(),
            "bypass-poll-ms" => t.bypass_poll_ms.to_string(),
            "ignore-window-secs" => t.ignore_window_secs.to_string(),
            "ignore-capacity" => t.ignore_capacity.to_string(),
            "license-wait-ms" => t.license_wait_ms.to_string(),
            "license-step-ms" => t.license_step_ms.to_string(),
            "validate-delay-ms" => t.validate_delay_ms.to_string(),
            "retry-max-attempts" => self.retry.max_attempts.to_string(),
            "retry-base-delay-ms" => self.retry.base_delay_ms.to_string(),
            "retry-max-delay-ms" => self.retry.max_delay_ms.to_string(),
            _ => anyhow::bail!("Unknown setting: {}", name),
        };
        Ok(value)
    }

    /// Parse and store a named setting (not saved)
    pub fn set_setting(&mut self, name: &str, value: &str) -> Result<()> {
        let t = &mut self.timing;
        match name {
            "backend-url" => {
                let url = value.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    anyhow::bail!("backend-url must start with http:// or https://");
                }
                self.backend.url = url.to_string();
            }
            "request-timeout-secs" => self.backend.request_timeout_secs = positive(name, value)?,
            "reconcile-period-ms" => t.reconcile_period_ms = positive(name, value)?,
            "game-poll-ms" => t.game_poll_ms = positive(name, value)?,
            "fix-apply-poll-ms" => t.fix_apply_poll_ms = positive(name, value)?,
            "fix-remove-poll-ms" => t.fix_remove_poll_ms = positive(name, value)?,
            "bypass-poll-ms" => t.bypass_poll_ms = positive(name, value)?,
            "ignore-window-secs" => t.ignore_window_secs = parse(name, value)?,
            "ignore-capacity" => t.ignore_capacity = positive::<u64>(name, value)? as usize,
            "license-wait-ms" => t.license_wait_ms = parse(name, value)?,
            "license-step-ms" => t.license_step_ms = positive(name, value)?,
            "validate-delay-ms" => t.validate_delay_ms = parse(name, value)?,
            "retry-max-attempts" => self.retry.max_attempts = positive::<u64>(name, value)? as u32,
            "retry-base-delay-ms" => self.retry.base_delay_ms = parse(name, value)?,
            "retry-max-delay-ms" => self.retry.max_delay_ms = parse(name, value)?,
            _ => anyhow::bail!("Unknown setting: {}", name),
        }
        Ok(())
    }

    /// Restore a named setting to its default (not saved)
    pub fn reset_setting(&mut self, name: &str) -> Result<()> {
        let default_value = Self::default().get_setting(name)?;
        self.set_setting(name, &default_value)
    }
}

fn parse<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: '{}'. Must be a non-negative integer.", name, value))
}

fn positive<T: std::str::FromStr + PartialEq + From<u8>>(name: &str, value: &str) -> Result<T> {
    let parsed: T = parse(name, value)?;
    if parsed == T::from(0) {
        anyhow::bail!("{} must be greater than 0", name);
    }
    Ok(parsed)
}
