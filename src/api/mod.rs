//! Client for the SteamLord plugin backend
//!
//! The backend exposes named methods that take a flat JSON object and answer
//! with a `{success, ...}` envelope. [`SteamLordClient`] wraps them in typed
//! calls on top of a pluggable [`Backend`] transport.

pub mod client;
pub mod constants;
pub mod error;
pub mod models;
pub mod resilience;
pub mod transport;

pub use client::SteamLordClient;
pub use error::RpcError;
pub use models::{ActiveEntry, ActiveGroups};
pub use resilience::{LogLevel, MonitoringConfig, ResilienceConfig, RetryConfig, RetryPolicy, RpcLogger};
pub use transport::{Backend, HttpBackend};
