//! Identity status for the backup prompt

use super::SharedUiState;
use crate::facades::identity::{IdentityFacade, IdentityResult};

pub struct IdentityState {
    facade: IdentityFacade,
    state: SharedUiState<IdentityResult>,
}

impl IdentityState {
    pub fn new(facade: IdentityFacade) -> Self {
        Self {
            facade,
            state: SharedUiState::default(),
        }
    }

    pub fn state(&self) -> &SharedUiState<IdentityResult> {
        &self.state
    }

    pub async fn fetch(&self) -> Option<IdentityResult> {
        let identity = self.state.run("fetch identity", self.facade.get()).await?;
        self.state.update(|data| *data = Some(identity.clone()));
        Some(identity)
    }

    pub async fn create(&self) -> Option<IdentityResult> {
        let identity = self.state.run("create identity", self.facade.create()).await?;
        self.state.update(|data| *data = Some(identity.clone()));
        Some(identity)
    }

    /// Confirm the user saved their keys; the private key is dropped locally
    pub async fn mark_backed_up(&self) -> bool {
        if self
            .state
            .run("mark identity backed up", self.facade.mark_backed_up())
            .await
            .is_none()
        {
            return false;
        }
        self.state.update(|data| *data = Some(IdentityResult::BackedUp));
        true
    }
}
