//! Send flow and transaction history

use super::SharedUiState;
use crate::facades::transaction::{HistoryEntry, SendRequest, TransactionFacade, TransactionResponse};
use crate::validation::TransactionForm;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub last_sent: Option<TransactionResponse>,
    pub history: Vec<HistoryEntry>,
}

pub struct TransactionState {
    facade: TransactionFacade,
    state: SharedUiState<TransactionData>,
}

impl TransactionState {
    pub fn new(facade: TransactionFacade) -> Self {
        Self {
            facade,
            state: SharedUiState::default(),
        }
    }

    pub fn state(&self) -> &SharedUiState<TransactionData> {
        &self.state
    }

    /// Send an already validated request
    pub async fn send(&self, request: &SendRequest) -> Option<TransactionResponse> {
        let response = self.state.run("send transaction", self.facade.send(request)).await?;
        self.state.update(|data| {
            data.get_or_insert_with(TransactionData::default).last_sent = Some(response.clone())
        });
        Some(response)
    }

    /// Validate the form against `balance_sats` and send it
    ///
    /// Field errors stay on the form and nothing reaches the host.
    pub async fn submit(
        &self,
        form: &mut TransactionForm,
        balance_sats: u64,
    ) -> Option<TransactionResponse> {
        let request = form.validate(balance_sats).ok()?;
        let response = self.send(&request).await?;
        form.reset();
        Some(response)
    }

    pub async fn load_history(&self) -> Option<Vec<HistoryEntry>> {
        let history = self
            .state
            .run("load transaction history", self.facade.get_history())
            .await?;
        self.state.update(|data| {
            data.get_or_insert_with(TransactionData::default).history = history.clone()
        });
        Some(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{ready_bridge, reply};
    use crate::facades::routes;
    use crate::validation::Field;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invalid_form_never_reaches_host() {
        let (bridge, channel) = ready_bridge();
        let state = TransactionState::new(TransactionFacade::new(bridge));
        let mut form = TransactionForm::new();
        form.set(Field::Recipient, "notanaddress");
        form.set(Field::Amount, "1");

        assert!(state.submit(&mut form, 100_000_000).await.is_none());
        assert!(channel.sent().is_empty());
        assert!(form.error(Field::Recipient).is_some());
        assert_eq!(state.state().error(), None);
    }

    #[tokio::test]
    async fn test_submit_sends_satoshis_and_resets_form() {
        let (bridge, channel) = ready_bridge();
        let state = Arc::new(TransactionState::new(TransactionFacade::new(bridge.clone())));

        let task = {
            let state = state.clone();
            tokio::spawn(async move {
                let mut form = TransactionForm::new();
                form.set(Field::Recipient, "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2");
                form.set(Field::Amount, "0.001");
                form.set(Field::FeeRate, "10");
                let response = state.submit(&mut form, 100_000_000).await;
                (response, form)
            })
        };

        channel.wait_for_sent(1).await;
        let sent = channel.sent().remove(0);
        assert_eq!(sent.command, "send_transaction");
        assert_eq!(sent.args[0]["amount"], 100_000);
        assert_eq!(sent.args[0]["feeRate"], 10);
        reply(
            &bridge,
            routes::SEND_TRANSACTION.success,
            json!({"txid": "beef", "rawTx": "", "fee": 226, "status": "broadcast", "broadcasted": true}),
        );

        let (response, form) = task.await.unwrap();
        assert_eq!(response.unwrap().txid, "beef");
        assert_eq!(form, TransactionForm::new());
        assert_eq!(
            state.state().snapshot().data.unwrap().last_sent.unwrap().fee,
            226
        );
    }

    #[tokio::test]
    async fn test_native_failure_lands_in_error_state() {
        let (bridge, channel) = ready_bridge();
        let state = Arc::new(TransactionState::new(TransactionFacade::new(bridge.clone())));
        let request = SendRequest {
            recipient: "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2".into(),
            amount: 1000,
            fee_rate: 1,
            memo: None,
        };

        let task = {
            let state = state.clone();
            tokio::spawn(async move { state.send(&request).await })
        };
        channel.wait_for_sent(1).await;
        reply(&bridge, routes::SEND_TRANSACTION.error.unwrap(), json!("Insufficient funds"));

        assert!(task.await.unwrap().is_none());
        assert_eq!(state.state().error().as_deref(), Some("Insufficient funds"));
        assert!(!state.state().is_loading());
    }
}
