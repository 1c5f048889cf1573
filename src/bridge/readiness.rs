//! Host readiness tracking
//!
//! The host announces `allSystemsReady` once. Until then callers either wait
//! on the watch channel or poll with a bounded number of attempts.

use crate::error::{BridgeError, BridgeResult};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug)]
pub struct Readiness {
    tx: watch::Sender<bool>,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

impl Readiness {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Record the host's readiness announcement; repeated calls are no-ops
    pub fn mark_ready(&self) {
        let changed = self.tx.send_if_modified(|ready| {
            let was = *ready;
            *ready = true;
            !was
        });
        if changed {
            log::info!("Native host announced readiness");
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    /// Poll `check` up to `attempts` times, sleeping `interval` between tries
    ///
    /// Returns the zero-based attempt on which the check first passed.
    pub async fn probe<F>(&self, attempts: u32, interval: Duration, mut check: F) -> BridgeResult<u32>
    where
        F: FnMut() -> bool,
    {
        for attempt in 0..attempts {
            if self.is_ready() || check() {
                return Ok(attempt);
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(interval).await;
            }
        }
        log::warn!("Native host not ready after {} attempts", attempts);
        Err(BridgeError::NotReady { attempts })
    }

    /// Wait for the readiness announcement up to `timeout`
    pub async fn wait(&self, timeout: Duration) -> BridgeResult<()> {
        let mut rx = self.tx.subscribe();
        let waited = tokio::time::timeout(timeout, rx.wait_for(|ready| *ready))
            .await
            .map(|res| res.map(|_| ()));
        match waited {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(BridgeError::Transport("readiness channel closed".into())),
            Err(_) => Err(BridgeError::NotReady { attempts: 1 }),
        }
    }
}
