//! How backend calls are retried and traced

use super::retry::RetryConfig;
use crate::config::RetrySettings;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub monitoring: MonitoringConfig,
}

/// What the RPC logger writes for successful calls (failures are always logged)
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub correlation_ids: bool,
    pub log_calls: bool,
    pub log_level: LogLevel,
}

/// Ordered from quietest to noisiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            correlation_ids: true,
            log_calls: true,
            log_level: LogLevel::Info,
        }
    }
}

impl ResilienceConfig {
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::default()
    }

    /// Retry policy from the `[retry]` section of the config file
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::builder()
            .attempts(settings.max_attempts)
            .backoff(
                Duration::from_millis(settings.base_delay_ms),
                Duration::from_millis(settings.max_delay_ms),
            )
            .build()
    }

    /// Single attempt and failures-only logging
    pub fn disabled() -> Self {
        Self {
            retry: RetryConfig::none(),
            monitoring: MonitoringConfig {
                correlation_ids: false,
                log_calls: false,
                log_level: LogLevel::Error,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts;
        self
    }

    /// Delay after attempt `n` is `n * base`, never more than `max`
    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.config.retry.base_delay = base;
        self.config.retry.max_delay = max;
        self
    }

    pub fn correlation_ids(mut self, enabled: bool) -> Self {
        self.config.monitoring.correlation_ids = enabled;
        self
    }

    pub fn log_calls(mut self, enabled: bool) -> Self {
        self.config.monitoring.log_calls = enabled;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.monitoring.log_level = level;
        self
    }

    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}
