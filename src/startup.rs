//! Main-view startup: wait for the host, then prompt for a backup if needed

use crate::bridge::Bridge;
use crate::error::BridgeError;
use crate::facades::identity::{IdentityFacade, IdentityResult};
use crate::facades::overlay::Panel;
use crate::panels::OverlayController;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum StartupOutcome {
    /// Identity is not backed up; the backup panel was opened
    BackupPrompted,
    /// Nothing to do
    Ready,
    /// The host never came up or the identity check failed; shown as "feature unavailable"
    FeatureUnavailable { reason: String },
}

/// Probe readiness, check identity, open the backup panel when required
///
/// Never fails: problems degrade to [`StartupOutcome::FeatureUnavailable`].
pub async fn check_identity_on_startup(
    bridge: &Arc<Bridge>,
    overlay: &mut OverlayController,
) -> StartupOutcome {
    if let Err(e) = bridge.probe_ready(Some("identity.get")).await {
        return unavailable(e);
    }

    let identity = match IdentityFacade::new(bridge.clone()).get().await {
        Ok(identity) => identity,
        Err(e) => return unavailable(e),
    };

    match identity {
        IdentityResult::Full(data) if !data.backed_up => {
            log::info!("Identity {} not backed up, opening backup panel", data.address);
            match overlay.open_panel(Panel::Backup) {
                Ok(()) => StartupOutcome::BackupPrompted,
                Err(e) => unavailable(e),
            }
        }
        _ => StartupOutcome::Ready,
    }
}

fn unavailable(e: BridgeError) -> StartupOutcome {
    log::error!("Startup identity check failed: {}", e);
    StartupOutcome::FeatureUnavailable {
        reason: e.to_string(),
    }
}
