//! Overlay window signals
//!
//! All of these are fire-and-forget: the host window manager never answers, so
//! none of them return a future.

use super::routes;
use crate::bridge::Bridge;
use crate::error::BridgeResult;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Panels the host can open in the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    Wallet,
    Settings,
    Backup,
    Brc100Auth,
}

impl Panel {
    /// Host command that opens this panel, if it has one
    pub fn show_command(&self) -> Option<&'static str> {
        match self {
            Panel::Wallet => Some(routes::OVERLAY_SHOW_WALLET),
            Panel::Settings => Some(routes::OVERLAY_SHOW_SETTINGS),
            Panel::Backup => Some(routes::OVERLAY_SHOW_BACKUP),
            // Opened by the host itself when an auth request arrives
            Panel::Brc100Auth => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "wallet" => Some(Panel::Wallet),
            "settings" => Some(Panel::Settings),
            "backup" => Some(Panel::Backup),
            "brc100auth" | "brc100_auth" => Some(Panel::Brc100Auth),
            _ => None,
        }
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Panel::Wallet => "wallet",
            Panel::Settings => "settings",
            Panel::Backup => "backup",
            Panel::Brc100Auth => "brc100auth",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct OverlayFacade {
    bridge: Arc<Bridge>,
}

impl OverlayFacade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    pub fn show(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::OVERLAY_SHOW, vec![])
    }

    pub fn hide(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::OVERLAY_HIDE, vec![])
    }

    /// Let the overlay receive mouse and keyboard input
    pub fn toggle_input(&self, enable: bool) -> BridgeResult<()> {
        self.bridge.signal(routes::OVERLAY_INPUT, vec![json!(enable)])
    }

    pub fn close(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::OVERLAY_CLOSE, vec![])
    }

    /// Ask the host to open `panel`; panels without a host command are a no-op
    pub fn show_panel(&self, panel: Panel) -> BridgeResult<()> {
        match panel.show_command() {
            Some(command) => self.bridge.signal(command, vec![]),
            None => Ok(()),
        }
    }

    pub fn force_repaint(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::FORCE_REPAINT, vec![])
    }
}
