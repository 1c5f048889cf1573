//! Overlay and panel state machine
//!
//! ```text
//! hidden -> shown(input disabled) -> shown(input enabled) -> hidden
//! ```
//!
//! Transitions only happen through explicit calls. There is no timed hide.

use crate::bridge::HostEvent;
use crate::error::{BridgeError, BridgeResult};
use crate::facades::brc100::{AuthDecision, AuthPrompt, Brc100Facade};
use crate::facades::overlay::{OverlayFacade, Panel};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OverlayState {
    Hidden,
    Shown {
        #[serde(rename = "inputEnabled")]
        input_enabled: bool,
    },
}

impl OverlayState {
    pub fn is_visible(&self) -> bool {
        matches!(self, OverlayState::Shown { .. })
    }
}

/// Which overlay window this controller drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayRoot {
    /// Waits for a panel trigger
    General,
    /// Mounted only when a backup is needed
    Backup,
    /// Mounted only when an auth request arrives
    Brc100Auth,
}

pub struct OverlayController {
    overlay: OverlayFacade,
    state: OverlayState,
    panel: Option<Panel>,
}

impl OverlayController {
    /// Backup and auth roots are visible as soon as they mount
    pub fn mount(overlay: OverlayFacade, root: OverlayRoot) -> Self {
        let (state, panel) = match root {
            OverlayRoot::General => (OverlayState::Hidden, None),
            OverlayRoot::Backup => (OverlayState::Shown { input_enabled: true }, Some(Panel::Backup)),
            OverlayRoot::Brc100Auth => (
                OverlayState::Shown { input_enabled: true },
                Some(Panel::Brc100Auth),
            ),
        };
        Self {
            overlay,
            state,
            panel,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn active_panel(&self) -> Option<Panel> {
        self.panel
    }

    /// Show the overlay with input still disabled; no-op when already shown
    pub fn show(&mut self) -> BridgeResult<()> {
        if self.state.is_visible() {
            return Ok(());
        }
        self.overlay.show()?;
        self.state = OverlayState::Shown {
            input_enabled: false,
        };
        Ok(())
    }

    pub fn toggle_input(&mut self, enable: bool) -> BridgeResult<()> {
        if !self.state.is_visible() {
            return Err(BridgeError::InvalidInput(
                "Cannot change input on a hidden overlay".into(),
            ));
        }
        self.overlay.toggle_input(enable)?;
        self.state = OverlayState::Shown {
            input_enabled: enable,
        };
        Ok(())
    }

    pub fn hide(&mut self) -> BridgeResult<()> {
        self.overlay.hide()?;
        self.state = OverlayState::Hidden;
        self.panel = None;
        Ok(())
    }

    /// Show the overlay, enable input and ask the host for `panel`
    pub fn open_panel(&mut self, panel: Panel) -> BridgeResult<()> {
        self.show()?;
        self.toggle_input(true)?;
        self.overlay.show_panel(panel)?;
        self.panel = Some(panel);
        log::info!("Opened {} panel", panel);
        Ok(())
    }

    /// Close the active panel: local state goes hidden first, then the host is told
    pub fn close_panel(&mut self) -> BridgeResult<()> {
        let closed = self.panel.take();
        let was_visible = self.state.is_visible();
        self.state = OverlayState::Hidden;

        if was_visible {
            self.overlay.toggle_input(false)?;
        }
        self.overlay.close()?;
        if let Some(panel) = closed {
            log::info!("Closed {} panel", panel);
        }
        Ok(())
    }

    /// Reply to a BRC-100 auth prompt, then close the auth panel either way
    pub fn answer_auth(
        &mut self,
        brc100: &Brc100Facade,
        prompt: &AuthPrompt,
        decision: AuthDecision,
    ) -> BridgeResult<()> {
        brc100.respond(prompt, decision)?;
        self.close_panel()
    }

    /// React to host-driven panel changes
    pub fn handle_event(&mut self, event: &HostEvent) {
        let panel = match event {
            HostEvent::TriggerPanel { panel } => match Panel::parse(panel) {
                Some(panel) => panel,
                None => {
                    log::warn!("Ignoring trigger for unknown panel '{}'", panel);
                    return;
                }
            },
            HostEvent::AuthRequest { .. } => Panel::Brc100Auth,
            _ => return,
        };
        self.panel = Some(panel);
        self.state = OverlayState::Shown {
            input_enabled: true,
        };
    }
}
