//! Per-feature UI state holders
//!
//! Each holder owns exactly one `{ data, is_loading, error }` triple and
//! exposes async actions. Actions never propagate bridge errors to the caller:
//! the message lands in `error` and the action returns `None`, so a retry is
//! just another call to the same action. Cross-feature sequencing (refresh the
//! balance after a send) is left to whoever holds both.

pub mod address;
pub mod balance;
pub mod identity;
pub mod transaction;
pub mod wallet;

pub use address::{AddressState, Clipboard};
pub use balance::{BalanceData, BalanceState, HttpPriceFeed, PriceFeed};
pub use identity::IdentityState;
pub use transaction::{TransactionData, TransactionState};
pub use wallet::{WalletSnapshot, WalletState};

use crate::error::BridgeResult;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState<T> {
    pub data: Option<T>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> Default for UiState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
        }
    }
}

/// Shared handle to one holder's state
pub struct SharedUiState<T> {
    inner: Arc<Mutex<UiState<T>>>,
}

impl<T> Clone for SharedUiState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for SharedUiState<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(UiState::default())),
        }
    }
}

impl<T: Clone> SharedUiState<T> {
    pub fn snapshot(&self) -> UiState<T> {
        self.lock().clone()
    }
}

impl<T> SharedUiState<T> {
    fn lock(&self) -> MutexGuard<'_, UiState<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutate the data in place
    pub fn update<R>(&self, f: impl FnOnce(&mut Option<T>) -> R) -> R {
        f(&mut self.lock().data)
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Run `action` with loading and error bookkeeping
    ///
    /// `is_loading` is reset even if the future is dropped mid-flight.
    pub async fn run<V, Fut>(&self, label: &str, action: Fut) -> Option<V>
    where
        Fut: Future<Output = BridgeResult<V>>,
    {
        {
            let mut state = self.lock();
            state.is_loading = true;
            state.error = None;
        }
        let _guard = LoadingGuard { state: self };

        match action.await {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{} failed: {}", label, e);
                self.lock().error = Some(e.to_string());
                None
            }
        }
    }
}

struct LoadingGuard<'a, T> {
    state: &'a SharedUiState<T>,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        self.state.lock().is_loading = false;
    }
}
