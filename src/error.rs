//! Error taxonomy for bridge calls
//!
//! Every facade returns `Result<T, BridgeError>`. Form validation is kept
//! separate (see [`crate::validation`]) and never travels through this type.

use std::time::Duration;
use thiserror::Error;

/// Failure of a call into the native host
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// The namespace or method is not installed on the bridge
    #[error("{0} not available")]
    CapabilityUnavailable(String),

    /// The host answered with an error message
    #[error("{0}")]
    Native(String),

    /// The host answered with something we could not decode
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No answer arrived before the deadline
    #[error("Timed out after {}ms waiting for response to '{channel}'", .after.as_millis())]
    Timeout { channel: String, after: Duration },

    /// The host never announced readiness
    #[error("Bridge not ready after {attempts} attempts")]
    NotReady { attempts: u32 },

    /// The command channel itself failed (closed pipe, write error)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Caller-supplied input rejected before reaching the host
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The price feed failed or returned an unusable price
    #[error("Price unavailable: {0}")]
    Price(String),
}

impl BridgeError {
    pub fn unavailable(what: impl Into<String>) -> Self {
        BridgeError::CapabilityUnavailable(what.into())
    }

    /// True when the host never responded, as opposed to responding with an error
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout { .. })
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Protocol(e.to_string())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
