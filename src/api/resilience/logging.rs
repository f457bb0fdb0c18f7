//! Structured logging with correlation tracking for backend calls
//!
//! Every RPC gets a short correlation id so a call, its retries and its
//! outcome can be followed in the log file.

use super::config::{LogLevel, MonitoringConfig};
use log::{debug, warn};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// Structured logger for RPC calls
#[derive(Debug, Clone)]
pub struct RpcLogger {
    config: MonitoringConfig,
}

/// Context for a single backend call
#[derive(Debug, Clone)]
pub struct CallContext {
    pub correlation_id: String,
    pub method: String,
    pub start_time: Instant,
}

impl CallContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl RpcLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    pub fn start_call(&self, method: &str, params: &Value) -> CallContext {
        let correlation_id = if self.config.correlation_ids {
            uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
        } else {
            String::from("-")
        };

        let context = CallContext {
            correlation_id,
            method: method.to_string(),
            start_time: Instant::now(),
        };

        if self.config.log_calls && self.should_log(LogLevel::Debug) {
            let log_data = json!({
                "event": "rpc_call",
                "correlation_id": context.correlation_id,
                "method": context.method,
                "params": params,
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            debug!("RPC Call: {}", log_data);
        }

        context
    }

    /// Log the outcome of a call; failures are logged regardless of settings
    pub fn complete_call(&self, context: &CallContext, error_message: Option<&str>) {
        let log_data = json!({
            "event": "rpc_completed",
            "correlation_id": context.correlation_id,
            "method": context.method,
            "duration_ms": context.elapsed().as_millis(),
            "success": error_message.is_none(),
            "error_message": error_message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        match error_message {
            None if self.config.log_calls && self.should_log(LogLevel::Debug) => {
                debug!("RPC Completed: {}", log_data)
            }
            None => {}
            Some(_) => warn!("RPC Failed: {}", log_data),
        }
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level <= self.config.log_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_context_creation() {
        let logger = RpcLogger::new(MonitoringConfig::default());
        let context = logger.start_call("SteamLordAddStatus", &json!({ "appid": 620 }));

        assert_eq!(context.method, "SteamLordAddStatus");
        assert_eq!(context.correlation_id.len(), 8);
    }

    #[test]
    fn test_correlation_ids_can_be_disabled() {
        let logger = RpcLogger::new(MonitoringConfig {
            correlation_ids: false,
            ..MonitoringConfig::default()
        });
        let context = logger.start_call("GetActiveDownloads", &Value::Null);

        assert_eq!(context.correlation_id, "-");
    }

    #[test]
    fn test_log_level_filtering() {
        let logger = RpcLogger::new(MonitoringConfig {
            log_level: LogLevel::Warn,
            ..MonitoringConfig::default()
        });

        assert!(logger.should_log(LogLevel::Error));
        assert!(logger.should_log(LogLevel::Warn));
        assert!(!logger.should_log(LogLevel::Info));
        assert!(!logger.should_log(LogLevel::Trace));
    }
}
