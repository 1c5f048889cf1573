//! Balance and its USD value
//!
//! The USD price comes from one HTTP source. A failed request or a
//! non-positive price is reported as an error rather than shown as $0.

use super::SharedUiState;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::facades::transaction::{satoshis_to_bsv, TransactionFacade};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Source of the BSV/USD price
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn bsv_usd(&self) -> BridgeResult<f64>;
}

/// Extract a usable price from a `{ "USD": <price> }` reply
pub fn parse_price(body: &Value) -> BridgeResult<f64> {
    let price = match body.get("USD") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| BridgeError::Price(format!("No USD price in response: {}", body)))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(BridgeError::Price(format!("Invalid price: {}", price)));
    }
    Ok(price)
}

/// CryptoCompare-style HTTP price feed
pub struct HttpPriceFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpPriceFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> BridgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Price(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> BridgeResult<Self> {
        Self::new(config.price_api_url.clone(), config.price_timeout())
    }
}

#[async_trait]
impl PriceFeed for HttpPriceFeed {
    async fn bsv_usd(&self) -> BridgeResult<f64> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| BridgeError::Price(format!("Price request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BridgeError::Price(format!(
                "Price API returned status: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Price(format!("Failed to parse price response: {}", e)))?;
        parse_price(&body)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    /// Satoshis; `None` until the host reports one
    pub balance: Option<u64>,
    /// Last fetched price; `None` until one succeeds
    pub price_usd: Option<f64>,
}

impl BalanceData {
    pub fn bsv(&self) -> Option<f64> {
        self.balance.map(satoshis_to_bsv)
    }

    pub fn usd_value(&self) -> Option<f64> {
        Some(self.bsv()? * self.price_usd?)
    }
}

pub struct BalanceState {
    transactions: TransactionFacade,
    price: Arc<dyn PriceFeed>,
    address: Mutex<Option<String>>,
    state: SharedUiState<BalanceData>,
}

impl BalanceState {
    pub fn new(transactions: TransactionFacade, price: Arc<dyn PriceFeed>) -> Self {
        Self {
            transactions,
            price,
            address: Mutex::new(None),
            state: SharedUiState::default(),
        }
    }

    pub fn state(&self) -> &SharedUiState<BalanceData> {
        &self.state
    }

    /// Restrict balance queries to one address
    pub fn set_address(&self, address: Option<String>) {
        if let Ok(mut current) = self.address.lock() {
            *current = address;
        }
    }

    fn address(&self) -> Option<String> {
        self.address.lock().ok().and_then(|a| a.clone())
    }

    pub async fn fetch_balance(&self) -> Option<u64> {
        let address = self.address();
        let balance = self
            .state
            .run("fetch balance", self.transactions.get_balance(address.as_deref()))
            .await?;

        self.state.update(|data| {
            data.get_or_insert_with(BalanceData::default).balance = Some(balance)
        });
        Some(balance)
    }

    pub async fn fetch_usd_price(&self) -> Option<f64> {
        let price = self.state.run("fetch price", self.price.bsv_usd()).await?;
        self.state.update(|data| {
            data.get_or_insert_with(BalanceData::default).price_usd = Some(price)
        });
        Some(price)
    }

    /// Balance first, then price; stops at the first failure
    pub async fn refresh(&self) -> Option<BalanceData> {
        self.fetch_balance().await?;
        self.fetch_usd_price().await?;
        self.state.snapshot().data
    }

    /// Refresh now and then every `period` until the handle is dropped
    ///
    /// Returns `None` without spawning when `period` is absent or zero.
    pub fn spawn_auto_refresh(self: &Arc<Self>, period: Option<Duration>) -> Option<AutoRefresh> {
        let period = period.filter(|p| !p.is_zero())?;
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                this.refresh().await;
            }
        });
        log::debug!("Balance auto-refresh every {}s", period.as_secs());
        Some(AutoRefresh { handle })
    }
}

/// Stops the refresh loop on drop
pub struct AutoRefresh {
    handle: JoinHandle<()>,
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
