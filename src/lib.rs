//! Renderer-side bridge for the BSV Browser shell
//!
//! The native host owns keys, transactions and BRC-100. This crate talks to it
//! through an injected [`bridge::Bridge`]: direct capability calls where the
//! host injected them, correlated command/response pairs everywhere else.

// Error taxonomy and persisted settings
pub mod config;
pub mod error;
pub mod logging;

// Host transport
pub mod bridge;

// Typed capabilities and the state built on them
pub mod facades;
pub mod panels;
pub mod startup;
pub mod state;
pub mod validation;

pub use bridge::{Bridge, HostEvent};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
