//! Retry and monitoring for backend calls

pub mod config;
pub mod logging;
pub mod retry;

pub use config::{LogLevel, MonitoringConfig, ResilienceConfig};
pub use logging::{CallContext, RpcLogger};
pub use retry::{RetryConfig, RetryPolicy};
