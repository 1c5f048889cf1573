//! Wallet lifecycle state

use super::SharedUiState;
use crate::facades::wallet::{WalletFacade, WalletStatus};
use serde::Serialize;

/// What the wallet panel shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub is_initialized: bool,
    pub needs_backup: bool,
    pub backed_up: bool,
    pub address: Option<String>,
    /// Only populated right after creation or an explicit load
    pub mnemonic: Option<String>,
    pub version: Option<String>,
}

pub struct WalletState {
    facade: WalletFacade,
    state: SharedUiState<WalletSnapshot>,
}

impl WalletState {
    pub fn new(facade: WalletFacade) -> Self {
        Self {
            facade,
            state: SharedUiState::default(),
        }
    }

    pub fn state(&self) -> &SharedUiState<WalletSnapshot> {
        &self.state
    }

    fn apply(&self, f: impl FnOnce(&mut WalletSnapshot)) {
        self.state
            .update(|data| f(data.get_or_insert_with(WalletSnapshot::default)));
    }

    pub async fn check_status(&self) -> Option<WalletStatus> {
        let status = self.state.run("wallet status", self.facade.get_status()).await?;
        self.apply(|w| {
            w.is_initialized = status.exists;
            w.needs_backup = status.needs_backup;
        });
        Some(status)
    }

    pub async fn create(&self) -> Option<WalletSnapshot> {
        let wallet = self.state.run("create wallet", self.facade.create()).await?;
        self.apply(|w| {
            w.is_initialized = true;
            w.backed_up = wallet.backed_up.unwrap_or(false);
            w.needs_backup = !w.backed_up;
            w.address = wallet.address.clone();
            w.mnemonic = Some(wallet.mnemonic.clone());
            w.version = wallet.version.clone();
        });
        self.state.snapshot().data
    }

    pub async fn load(&self) -> Option<WalletSnapshot> {
        let loaded = self.state.run("load wallet", self.facade.load()).await?;
        self.apply(|w| {
            w.is_initialized = true;
            w.backed_up = loaded.backed_up;
            w.needs_backup = !loaded.backed_up;
            w.address = Some(loaded.address.clone());
            w.mnemonic = Some(loaded.mnemonic.clone());
            w.version = Some(loaded.version.clone());
        });
        self.state.snapshot().data
    }

    pub async fn refresh_info(&self) -> Option<WalletSnapshot> {
        let info = self.state.run("wallet info", self.facade.get_info()).await?;
        self.apply(|w| {
            w.is_initialized = true;
            w.backed_up = info.backed_up;
            w.address = Some(info.address.clone());
            w.version = Some(info.version.clone());
        });
        self.state.snapshot().data
    }

    pub async fn current_address(&self) -> Option<String> {
        let data = self
            .state
            .run("current address", self.facade.get_current_address())
            .await?;
        self.apply(|w| w.address = Some(data.address.clone()));
        Some(data.address)
    }

    pub async fn generate_address(&self) -> Option<String> {
        let data = self
            .state
            .run("generate address", self.facade.generate_address())
            .await?;
        self.apply(|w| w.address = Some(data.address.clone()));
        Some(data.address)
    }

    /// Record the backup and drop the mnemonic from memory
    pub async fn mark_backed_up(&self) -> bool {
        let Some(ack) = self
            .state
            .run("mark wallet backed up", self.facade.mark_backed_up())
            .await
        else {
            return false;
        };
        if ack.success {
            self.apply(|w| {
                w.backed_up = true;
                w.needs_backup = false;
                w.mnemonic = None;
            });
        }
        ack.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::ready_bridge;
    use crate::bridge::{FnMethod, Installer};
    use serde_json::json;
    use std::sync::Arc;

    fn wallet_state() -> WalletState {
        let (bridge, _channel) = ready_bridge();
        let registry = bridge.registry();
        registry
            .install(
                "wallet.getStatus",
                Arc::new(FnMethod(|_| Ok(json!({"exists": false, "needsBackup": false})))),
                Installer::Host,
            )
            .unwrap();
        registry
            .install(
                "wallet.create",
                Arc::new(FnMethod(|_| {
                    Ok(json!({"success": true, "wallet": {"mnemonic": "legal winner thank", "address": "1new", "version": "1.0"}}))
                })),
                Installer::Host,
            )
            .unwrap();
        registry
            .install(
                "wallet.markBackedUp",
                Arc::new(FnMethod(|_| Ok(json!({"success": true})))),
                Installer::Host,
            )
            .unwrap();
        WalletState::new(WalletFacade::new(bridge))
    }

    #[tokio::test]
    async fn test_create_then_backup() {
        let wallet = wallet_state();

        let status = wallet.check_status().await.unwrap();
        assert!(!status.exists);

        let created = wallet.create().await.unwrap();
        assert!(created.is_initialized);
        assert!(created.needs_backup);
        assert_eq!(created.mnemonic.as_deref(), Some("legal winner thank"));

        assert!(wallet.mark_backed_up().await);
        let snapshot = wallet.state().snapshot().data.unwrap();
        assert!(snapshot.backed_up);
        assert!(!snapshot.needs_backup);
        assert_eq!(snapshot.mnemonic, None);
        assert_eq!(snapshot.address.as_deref(), Some("1new"));
    }

    #[tokio::test]
    async fn test_create_reply_without_wallet_sets_error() {
        let (bridge, _channel) = ready_bridge();
        bridge
            .registry()
            .install(
                "wallet.create",
                Arc::new(FnMethod(|_| Ok(json!({"success": true, "wallet": null})))),
                Installer::Host,
            )
            .unwrap();
        let wallet = WalletState::new(WalletFacade::new(bridge));

        assert!(wallet.create().await.is_none());
        assert_eq!(
            wallet.state().error().as_deref(),
            Some("Protocol error: Wallet creation reply carried no wallet")
        );
        assert!(wallet.state().snapshot().data.is_none());
        assert!(!wallet.state().is_loading());
    }

    #[tokio::test]
    async fn test_missing_capability_is_reported_not_raised() {
        let bridge = Arc::new(crate::bridge::Bridge::new(
            crate::config::BridgeConfig::default(),
            None,
        ));
        let bare = WalletState::new(WalletFacade::new(bridge));

        assert!(bare.load().await.is_none());
        assert_eq!(
            bare.state().error().as_deref(),
            Some("wallet.load not available")
        );
        assert!(!bare.state().is_loading());
    }
}
