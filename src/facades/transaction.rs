//! Transaction construction, signing, broadcast and history
//!
//! Amounts cross the bridge in satoshis. Callers convert user-entered BSV with
//! [`bsv_to_satoshis`] (or go through [`crate::validation`], which does).

use super::routes;
use crate::bridge::envelope::decode;
use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const SATOSHIS_PER_BSV: f64 = 100_000_000.0;

/// Round a BSV amount to whole satoshis
pub fn bsv_to_satoshis(amount_bsv: f64) -> BridgeResult<u64> {
    if !amount_bsv.is_finite() || amount_bsv < 0.0 {
        return Err(BridgeError::InvalidInput(format!(
            "Cannot convert {} BSV to satoshis",
            amount_bsv
        )));
    }
    Ok((amount_bsv * SATOSHIS_PER_BSV).round() as u64)
}

pub fn satoshis_to_bsv(satoshis: u64) -> f64 {
    satoshis as f64 / SATOSHIS_PER_BSV
}

/// A validated outgoing payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(rename = "toAddress")]
    pub recipient: String,
    /// Satoshis
    pub amount: u64,
    /// Satoshis per byte
    pub fee_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub txid: String,
    #[serde(default)]
    pub raw_tx: String,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub broadcasted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub txid: String,
    pub success: bool,
    /// Per-miner acceptance messages
    #[serde(default)]
    pub miners: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// One row of the transaction history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub txid: String,
    pub status: TxStatus,
    pub amount: i64,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub confirmations: u32,
    #[serde(default)]
    pub fee: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BalanceReply {
    balance: u64,
}

#[derive(Clone)]
pub struct TransactionFacade {
    bridge: Arc<Bridge>,
}

impl TransactionFacade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    /// Build an unsigned transaction
    pub async fn create(&self, request: &SendRequest) -> BridgeResult<TransactionResponse> {
        let args = vec![serde_json::to_value(request)?];
        decode(
            self.bridge
                .invoke(Some("transaction.create"), Some(routes::CREATE_TRANSACTION), args)
                .await?,
        )
    }

    pub async fn sign(&self, unsigned: &TransactionResponse) -> BridgeResult<TransactionResponse> {
        let args = vec![json!({ "txid": unsigned.txid, "rawTx": unsigned.raw_tx })];
        decode(
            self.bridge
                .invoke(Some("transaction.sign"), Some(routes::SIGN_TRANSACTION), args)
                .await?,
        )
    }

    /// `success: false` from the host surfaces as a native error
    pub async fn broadcast(&self, signed: &TransactionResponse) -> BridgeResult<BroadcastResponse> {
        let args = vec![json!({ "txid": signed.txid, "rawTx": signed.raw_tx })];
        decode(
            self.bridge
                .invoke(
                    Some("transaction.broadcast"),
                    Some(routes::BROADCAST_TRANSACTION),
                    args,
                )
                .await?,
        )
    }

    /// Create, sign and broadcast in one host round trip
    pub async fn send(&self, request: &SendRequest) -> BridgeResult<TransactionResponse> {
        log::info!(
            "Sending {} sat to {} at {} sat/byte",
            request.amount,
            request.recipient,
            request.fee_rate
        );
        let args = vec![serde_json::to_value(request)?];
        let response: TransactionResponse = decode(
            self.bridge
                .invoke(Some("wallet.sendTransaction"), Some(routes::SEND_TRANSACTION), args)
                .await?,
        )?;
        log::info!("Transaction {} {}", response.txid, response.status);
        Ok(response)
    }

    /// Balance in satoshis, optionally for one address
    pub async fn get_balance(&self, address: Option<&str>) -> BridgeResult<u64> {
        let args = match address {
            Some(address) => vec![json!({ "address": address })],
            None => vec![],
        };
        let reply: BalanceReply = decode(
            self.bridge
                .invoke(Some("transaction.getBalance"), Some(routes::GET_BALANCE), args)
                .await?,
        )?;
        Ok(reply.balance)
    }

    pub async fn get_history(&self) -> BridgeResult<Vec<HistoryEntry>> {
        let value: Value = self
            .bridge
            .invoke(
                Some("transaction.getHistory"),
                Some(routes::GET_TRANSACTION_HISTORY),
                vec![],
            )
            .await?;
        decode(value)
    }
}
