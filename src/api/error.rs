//! Error taxonomy of the RPC boundary

use std::fmt;

/// Why a backend call did not produce a usable response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The call itself did not complete (connection, timeout, HTTP failure)
    Transport(String),
    /// Well-formed response with `success: false`
    Application(String),
    /// Response could not be parsed into the expected shape
    Decode(String),
}

impl RpcError {
    /// Only transport failures are worth another attempt
    pub fn should_retry(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }

    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            RpcError::Transport(format!("HTTP {}: {}", status.as_u16(), error))
        } else if error.is_decode() {
            RpcError::Decode(error.to_string())
        } else {
            RpcError::Transport(error.to_string())
        }
    }

    /// Text for the user: the backend's own message when it sent one
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            RpcError::Application(message) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Transport(message) => write!(f, "transport error: {}", message),
            RpcError::Application(message) => write!(f, "backend error: {}", message),
            RpcError::Decode(message) => write!(f, "malformed response: {}", message),
        }
    }
}

impl std::error::Error for RpcError {}
