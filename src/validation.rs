//! Send-form validation
//!
//! All fields are checked together and every problem is reported at once,
//! keyed by field. Editing a field clears only that field's message. Nothing
//! here talks to the host.

use crate::facades::transaction::{bsv_to_satoshis, SendRequest, SATOSHIS_PER_BSV};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Smallest output the network relays
pub const DUST_LIMIT_SATS: u64 = 546;
pub const MIN_FEE_RATE: i64 = 1;
pub const MAX_FEE_RATE: i64 = 1000;
pub const DEFAULT_FEE_RATE: &str = "5";

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$").expect("address pattern is valid")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Recipient,
    Amount,
    FeeRate,
    Memo,
}

/// Per-field error messages
pub type FieldErrors = BTreeMap<Field, String>;

/// Recipient must look like a P2PKH/P2SH Base58 address (shape only)
pub fn validate_recipient(recipient: &str) -> Result<(), String> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err("Recipient address is required".to_string());
    }
    if !address_pattern().is_match(recipient) {
        return Err("Invalid Bitcoin address format".to_string());
    }
    Ok(())
}

/// Amount in BSV, checked against dust and the known balance; returns satoshis
pub fn validate_amount(amount: &str, balance_sats: u64) -> Result<u64, String> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err("Amount is required".to_string());
    }

    let value: f64 = match amount.parse() {
        Ok(v) if f64::is_finite(v) && v > 0.0 => v,
        _ => return Err("Amount must be a positive number".to_string()),
    };

    // Limits apply to the amount as typed; rounding happens only afterwards
    let exact_sats = value * SATOSHIS_PER_BSV;
    if exact_sats < DUST_LIMIT_SATS as f64 {
        return Err("Amount must be at least 546 satoshis (0.00000546 BSV)".to_string());
    }
    if exact_sats > balance_sats as f64 {
        return Err("Insufficient balance".to_string());
    }
    bsv_to_satoshis(value).map_err(|e| e.to_string())
}

/// Fee rate in satoshis per byte, inclusive range
pub fn validate_fee_rate(fee_rate: &str) -> Result<u32, String> {
    match fee_rate.trim().parse::<i64>() {
        Ok(rate) if (MIN_FEE_RATE..=MAX_FEE_RATE).contains(&rate) => Ok(rate as u32),
        _ => Err("Fee rate must be between 1 and 1000 satoshis per byte".to_string()),
    }
}

/// Editable state of the send form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    pub recipient: String,
    /// BSV, as typed
    pub amount: String,
    pub fee_rate: String,
    pub memo: String,
    errors: FieldErrors,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            amount: String::new(),
            fee_rate: DEFAULT_FEE_RATE.to_string(),
            memo: String::new(),
            errors: FieldErrors::new(),
        }
    }
}

impl TransactionForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update one field and clear its error
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Recipient => self.recipient = value,
            Field::Amount => self.amount = value,
            Field::FeeRate => self.fee_rate = value,
            Field::Memo => self.memo = value,
        }
        self.errors.remove(&field);
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Validate every field; on success the request is ready for the host
    pub fn validate(&mut self, balance_sats: u64) -> Result<SendRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Err(e) = validate_recipient(&self.recipient) {
            errors.insert(Field::Recipient, e);
        }
        let amount = validate_amount(&self.amount, balance_sats)
            .map_err(|e| errors.insert(Field::Amount, e))
            .ok();
        let fee_rate = validate_fee_rate(&self.fee_rate)
            .map_err(|e| errors.insert(Field::FeeRate, e))
            .ok();

        self.errors = errors.clone();
        match (amount, fee_rate) {
            (Some(amount), Some(fee_rate)) if errors.is_empty() => {
                let memo = self.memo.trim();
                Ok(SendRequest {
                    recipient: self.recipient.trim().to_string(),
                    amount,
                    fee_rate,
                    memo: (!memo.is_empty()).then(|| memo.to_string()),
                })
            }
            _ => Err(errors),
        }
    }

    /// Back to an empty form after a successful send
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
