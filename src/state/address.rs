//! Current receiving address

use super::SharedUiState;
use crate::error::BridgeError;
use crate::facades::address::{AddressData, AddressFacade};

/// Where a generated address gets copied to
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), String>;
}

pub struct AddressState {
    facade: AddressFacade,
    state: SharedUiState<AddressData>,
}

impl AddressState {
    pub fn new(facade: AddressFacade) -> Self {
        Self {
            facade,
            state: SharedUiState::default(),
        }
    }

    pub fn state(&self) -> &SharedUiState<AddressData> {
        &self.state
    }

    pub fn current(&self) -> Option<String> {
        self.state.snapshot().data.map(|d| d.address)
    }

    pub async fn generate(&self) -> Option<AddressData> {
        let data = self.state.run("generate address", self.facade.generate()).await?;
        self.state.update(|current| *current = Some(data.clone()));
        Some(data)
    }

    /// Generate a fresh address and put it on the clipboard
    pub async fn generate_and_copy(&self, clipboard: &dyn Clipboard) -> Option<AddressData> {
        let data = self
            .state
            .run("generate and copy address", self.generate_copied(clipboard))
            .await?;
        log::info!("Copied {} to clipboard", data.address);
        self.state.update(|current| *current = Some(data.clone()));
        Some(data)
    }

    async fn generate_copied(&self, clipboard: &dyn Clipboard) -> Result<AddressData, BridgeError> {
        let data = self.facade.generate().await?;
        clipboard
            .write_text(&data.address)
            .map_err(|e| BridgeError::InvalidInput(format!("Failed to copy to clipboard: {}", e)))?;
        Ok(data)
    }
}
