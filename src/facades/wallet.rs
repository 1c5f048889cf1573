//! Wallet lifecycle and backup state

use super::address::AddressData;
use super::routes;
use crate::bridge::envelope::{decode, unwrap_envelope};
use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub exists: bool,
    #[serde(default)]
    pub needs_backup: bool,
}

/// Secrets returned once when a wallet is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWallet {
    pub mnemonic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backed_up: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<NewWallet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreateWalletResult {
    /// Accepts both `{ success, wallet: {...} }` and the flat callback shape
    fn from_value(value: Value) -> BridgeResult<Self> {
        let value = unwrap_envelope(value)?;
        if value.get("wallet").is_some() {
            return decode(value);
        }
        let wallet: NewWallet = decode(value)?;
        Ok(Self {
            success: true,
            wallet: Some(wallet),
            error: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedWallet {
    #[serde(default = "default_true")]
    pub success: bool,
    pub address: String,
    pub mnemonic: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub backed_up: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    #[serde(default)]
    pub version: String,
    pub mnemonic: String,
    pub address: String,
    #[serde(default)]
    pub backed_up: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackupModalState {
    pub shown: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone)]
pub struct WalletFacade {
    bridge: Arc<Bridge>,
}

impl WalletFacade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    async fn call(
        &self,
        method: &str,
        route: crate::bridge::Route,
        args: Vec<Value>,
    ) -> BridgeResult<Value> {
        let path = format!("wallet.{}", method);
        self.bridge.invoke(Some(&path), Some(route), args).await
    }

    pub async fn get_status(&self) -> BridgeResult<WalletStatus> {
        decode(self.call("getStatus", routes::WALLET_STATUS, vec![]).await?)
    }

    /// Create a new wallet; a host-side failure is an error, never `success: false`
    /// The new wallet, including its mnemonic; a success reply without one is a protocol error
    pub async fn create(&self) -> BridgeResult<NewWallet> {
        let value = self.call("create", routes::CREATE_WALLET, vec![]).await?;
        let result = CreateWalletResult::from_value(value)?;
        if !result.success {
            return Err(BridgeError::Native(
                result
                    .error
                    .unwrap_or_else(|| "Wallet creation failed".to_string()),
            ));
        }
        let wallet = result
            .wallet
            .ok_or_else(|| BridgeError::Protocol("Wallet creation reply carried no wallet".into()))?;
        log::info!("Wallet created");
        Ok(wallet)
    }

    pub async fn load(&self) -> BridgeResult<LoadedWallet> {
        let loaded: LoadedWallet = decode(self.call("load", routes::LOAD_WALLET, vec![]).await?)?;
        log::info!("Wallet loaded ({})", loaded.address);
        Ok(loaded)
    }

    pub async fn get_info(&self) -> BridgeResult<WalletInfo> {
        decode(self.call("getInfo", routes::GET_WALLET_INFO, vec![]).await?)
    }

    /// Same host operation as `address.generate`, reached through the wallet namespace
    pub async fn generate_address(&self) -> BridgeResult<AddressData> {
        decode(
            self.call("generateAddress", routes::ADDRESS_GENERATE, vec![])
                .await?,
        )
    }

    pub async fn get_current_address(&self) -> BridgeResult<AddressData> {
        decode(
            self.call("getCurrentAddress", routes::GET_CURRENT_ADDRESS, vec![])
                .await?,
        )
    }

    pub async fn get_addresses(&self) -> BridgeResult<Vec<AddressData>> {
        decode(self.call("getAddresses", routes::GET_ADDRESSES, vec![]).await?)
    }

    pub async fn mark_backed_up(&self) -> BridgeResult<Ack> {
        decode(
            self.call("markBackedUp", routes::MARK_WALLET_BACKED_UP, vec![])
                .await?,
        )
    }

    pub async fn get_backup_modal_state(&self) -> BridgeResult<BackupModalState> {
        decode(
            self.call("getBackupModalState", routes::GET_BACKUP_MODAL_STATE, vec![])
                .await?,
        )
    }

    pub async fn set_backup_modal_state(&self, shown: bool) -> BridgeResult<Ack> {
        decode(
            self.call(
                "setBackupModalState",
                routes::SET_BACKUP_MODAL_STATE,
                vec![json!(shown)],
            )
            .await?,
        )
    }
}
