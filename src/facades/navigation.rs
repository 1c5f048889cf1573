//! Browser navigation commands

use super::routes;
use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use serde_json::json;
use std::sync::Arc;
use url::Url;

/// Normalise a user-entered target the way the host does: bare hosts get `http://`
pub fn normalize_target(input: &str) -> BridgeResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::InvalidInput("Navigation target is empty".into()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| BridgeError::InvalidInput(format!("Invalid URL '{}': {}", trimmed, e)))?;
    Ok(url.to_string())
}

#[derive(Clone)]
pub struct NavigationFacade {
    bridge: Arc<Bridge>,
}

impl NavigationFacade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Navigate the active tab; resolves once the request is handed to the host
    pub async fn navigate(&self, target: &str) -> BridgeResult<()> {
        let url = normalize_target(target)?;
        log::info!("Navigating to {}", url);
        self.bridge
            .registry()
            .call("navigation.navigate", vec![json!(url)])
            .await?;
        Ok(())
    }

    pub fn back(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::NAVIGATE_BACK, vec![])
    }

    pub fn forward(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::NAVIGATE_FORWARD, vec![])
    }

    pub fn reload(&self) -> BridgeResult<()> {
        self.bridge.signal(routes::NAVIGATE_RELOAD, vec![])
    }
}
