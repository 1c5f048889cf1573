//! Address generation

use super::routes;
use crate::bridge::envelope::decode;
use crate::bridge::Bridge;
use crate::error::BridgeResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A wallet address as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressData {
    pub address: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Fields we do not interpret (derivation path, labels, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone)]
pub struct AddressFacade {
    bridge: Arc<Bridge>,
}

impl AddressFacade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Derive a fresh receiving address; safe to call repeatedly
    pub async fn generate(&self) -> BridgeResult<AddressData> {
        let value = self
            .bridge
            .invoke(Some("address.generate"), Some(routes::ADDRESS_GENERATE), vec![])
            .await?;
        let data: AddressData = decode(value)?;
        log::info!("Generated address {}", data.address);
        Ok(data)
    }
}
