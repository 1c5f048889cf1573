//! Request/response correlation over the fire-and-forget command channel
//!
//! Each request registers a pending entry holding a oneshot responder, then
//! sends its command. Inbound host events are matched to the pending entry by
//! `requestId` when the host echoes one, otherwise to the oldest pending entry
//! listening on that surface. The entry is removed before it is resolved, so a
//! request settles exactly once and late events find nothing to resolve.

use super::envelope::{HostEvent, OutboundMessage, Route, Surface};
use crate::error::{BridgeError, BridgeResult};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// Sink for outbound host commands
pub trait CommandChannel: Send + Sync {
    fn send(&self, message: OutboundMessage) -> BridgeResult<()>;
}

/// A single correlated call
#[derive(Debug, Clone)]
pub struct CorrelatedRequest {
    pub route: Route,
    pub args: Vec<Value>,
    /// Overrides the configured default deadline
    pub timeout: Option<Duration>,
}

impl CorrelatedRequest {
    pub fn new(route: Route, args: Vec<Value>) -> Self {
        Self {
            route,
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct PendingRequest {
    id: u64,
    route: Route,
    responder: oneshot::Sender<BridgeResult<Value>>,
}

/// Removes the pending entry if the request future is dropped or finishes
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.correlator.take(self.id);
    }
}

pub struct Correlator {
    channel: Option<Arc<dyn CommandChannel>>,
    pending: Mutex<Vec<PendingRequest>>,
    next_id: AtomicU64,
    default_timeout: Duration,
}

impl Correlator {
    pub fn new(channel: Option<Arc<dyn CommandChannel>>, default_timeout: Duration) -> Self {
        Self {
            channel,
            pending: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            default_timeout,
        }
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Send a fire-and-forget command
    pub fn send(&self, message: OutboundMessage) -> BridgeResult<()> {
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| BridgeError::unavailable("cefMessage.send"))?;
        channel.send(message)
    }

    /// Send `request` and wait for its response, error or deadline
    pub async fn request(&self, request: CorrelatedRequest) -> BridgeResult<Value> {
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| BridgeError::unavailable("cefMessage.send"))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let route = request.route;
        let (tx, mut rx) = oneshot::channel();

        self.lock_pending().push(PendingRequest {
            id,
            route,
            responder: tx,
        });
        let _guard = PendingGuard {
            correlator: self,
            id,
        };

        log::debug!("-> {} (request {})", route.command, id);
        channel.send(OutboundMessage {
            command: route.command.to_string(),
            args: request.args,
            request_id: Some(id),
        })?;

        let deadline = request.timeout.unwrap_or(self.default_timeout);
        match tokio::time::timeout(deadline, &mut rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(BridgeError::Transport(format!(
                "request {} for '{}' was abandoned",
                id, route.command
            ))),
            Err(_) => {
                if self.take(id).is_some() {
                    log::warn!(
                        "No response to '{}' after {}ms",
                        route.command,
                        deadline.as_millis()
                    );
                    return Err(BridgeError::Timeout {
                        channel: route.command.to_string(),
                        after: deadline,
                    });
                }
                // Dispatch already claimed the entry and is about to resolve it
                rx.await.unwrap_or_else(|_| {
                    Err(BridgeError::Timeout {
                        channel: route.command.to_string(),
                        after: deadline,
                    })
                })
            }
        }
    }

    /// Route an inbound host event to the request waiting for it
    ///
    /// Returns false when no pending request matched (late or unsolicited event).
    pub fn dispatch(&self, event: &HostEvent) -> bool {
        let matched = {
            let mut pending = self.lock_pending();
            let position = pending.iter().position(|p| {
                let on_surface = p.route.success.matches(event)
                    || p.route.error.map_or(false, |s| s.matches(event));
                match event.request_id() {
                    Some(id) => p.id == id && on_surface,
                    None => on_surface,
                }
            });
            position.map(|i| pending.remove(i))
        };

        let Some(entry) = matched else {
            log::debug!("Dropping unmatched host event {:?}", event);
            return false;
        };

        let outcome = if entry.route.success.matches(event) {
            event.success_payload()
        } else {
            let message = event.error_message();
            log::warn!("'{}' failed: {}", entry.route.command, message);
            Err(BridgeError::Native(message))
        };
        log::debug!("<- {} (request {})", entry.route.command, entry.id);

        // Receiver gone means the caller was cancelled; nothing left to do
        let _ = entry.responder.send(outcome);
        true
    }

    /// Reject every pending request, e.g. when the host connection closes
    pub fn fail_all(&self, error: BridgeError) {
        let drained: Vec<PendingRequest> = self.lock_pending().drain(..).collect();
        if !drained.is_empty() {
            log::warn!("Failing {} pending bridge requests: {}", drained.len(), error);
        }
        for entry in drained {
            let _ = entry.responder.send(Err(error.clone()));
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Number of pending requests listening on `surface`
    pub fn listener_count(&self, surface: Surface) -> usize {
        self.lock_pending()
            .iter()
            .filter(|p| p.route.success == surface || p.route.error == Some(surface))
            .count()
    }

    fn take(&self, id: u64) -> Option<PendingRequest> {
        let mut pending = self.lock_pending();
        let position = pending.iter().position(|p| p.id == id)?;
        Some(pending.remove(position))
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<PendingRequest>> {
        // A panic while holding the lock cannot leave the Vec half-updated
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::RecordingChannel;
    use serde_json::json;

    const GENERATE: Route = Route {
        command: "address_generate",
        success: Surface::Callback("onAddressGenerated"),
        error: Some(Surface::Callback("onAddressError")),
    };

    const SIGN: Route = Route {
        command: "sign_transaction",
        success: Surface::Event("sign_transaction_response"),
        error: Some(Surface::Callback("onSignTransactionError")),
    };

    fn correlator() -> (Arc<Correlator>, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::default());
        let correlator = Arc::new(Correlator::new(
            Some(channel.clone() as Arc<dyn CommandChannel>),
            Duration::from_secs(10),
        ));
        (correlator, channel)
    }

    fn callback(name: &str, payload: Value, request_id: Option<u64>) -> HostEvent {
        HostEvent::Callback {
            name: name.into(),
            payload,
            request_id,
        }
    }

    #[tokio::test]
    async fn test_success_resolves_and_cleans_up() {
        let (correlator, channel) = correlator();
        let task = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };

        channel.wait_for_sent(1).await;
        assert_eq!(channel.sent()[0].command, "address_generate");
        assert_eq!(correlator.listener_count(GENERATE.success), 1);

        assert!(correlator.dispatch(&callback(
            "onAddressGenerated",
            json!({"address": "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"}),
            None
        )));

        let value = task.await.unwrap().unwrap();
        assert_eq!(value["address"], "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2");
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_error_surface_rejects_with_native_message() {
        let (correlator, channel) = correlator();
        let task = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(1).await;

        correlator.dispatch(&callback("onAddressError", json!("wallet locked"), None));

        assert_eq!(
            task.await.unwrap(),
            Err(BridgeError::Native("wallet locked".into()))
        );
        assert_eq!(correlator.listener_count(GENERATE.error.unwrap()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_removes_listeners_and_ignores_late_response() {
        let (correlator, _channel) = correlator();
        let result = correlator
            .request(CorrelatedRequest::new(GENERATE, vec![]).with_timeout(Duration::from_millis(500)))
            .await;

        assert!(matches!(result, Err(BridgeError::Timeout { ref channel, .. }) if channel == "address_generate"));
        assert_eq!(correlator.pending_count(), 0);

        let late = callback("onAddressGenerated", json!({"address": "1late"}), None);
        assert!(!correlator.dispatch(&late));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_claimed_before_deadline_still_delivered() {
        let (correlator, channel) = correlator();
        let task = {
            let c = correlator.clone();
            tokio::spawn(async move {
                c.request(CorrelatedRequest::new(GENERATE, vec![]).with_timeout(Duration::from_millis(500)))
                    .await
            })
        };
        channel.wait_for_sent(1).await;

        // Entry claimed as dispatch would, but resolved only after the deadline
        let claimed = correlator.take(1).unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        claimed.responder.send(Ok(json!({"address": "1claimed"}))).unwrap();

        let value = task.await.unwrap().unwrap();
        assert_eq!(value["address"], "1claimed");
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_event_payload_rejects_as_protocol() {
        let (correlator, channel) = correlator();
        let task = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(SIGN, vec![])).await })
        };
        channel.wait_for_sent(1).await;

        correlator.dispatch(&HostEvent::Response {
            message: "sign_transaction_response".into(),
            args: vec!["<html>".into()],
            request_id: None,
        });

        assert!(matches!(task.await.unwrap(), Err(BridgeError::Protocol(_))));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_matched_by_request_id() {
        let (correlator, channel) = correlator();
        let first = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(1).await;
        let second = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(2).await;

        let sent = channel.sent();
        let (id1, id2) = (sent[0].request_id, sent[1].request_id);
        assert_ne!(id1, id2);

        // Answer out of order
        correlator.dispatch(&callback("onAddressGenerated", json!("second"), id2));
        correlator.dispatch(&callback("onAddressGenerated", json!("first"), id1));

        assert_eq!(first.await.unwrap().unwrap(), json!("first"));
        assert_eq!(second.await.unwrap().unwrap(), json!("second"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_without_ids_resolve_in_order() {
        let (correlator, channel) = correlator();
        let first = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(1).await;
        let second = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(2).await;

        correlator.dispatch(&callback("onAddressGenerated", json!("a"), None));
        correlator.dispatch(&callback("onAddressGenerated", json!("b"), None));

        assert_eq!(first.await.unwrap().unwrap(), json!("a"));
        assert_eq!(second.await.unwrap().unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn test_unknown_request_id_is_ignored() {
        let (correlator, channel) = correlator();
        let task = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(1).await;

        assert!(!correlator.dispatch(&callback("onAddressGenerated", json!("stale"), Some(9999))));
        assert_eq!(correlator.pending_count(), 1);

        correlator.fail_all(BridgeError::Transport("host closed".into()));
        assert_eq!(
            task.await.unwrap(),
            Err(BridgeError::Transport("host closed".into()))
        );
    }

    #[tokio::test]
    async fn test_send_failure_leaves_nothing_pending() {
        let channel = Arc::new(RecordingChannel::closed());
        let correlator = Correlator::new(
            Some(channel as Arc<dyn CommandChannel>),
            Duration::from_secs(10),
        );

        let result = correlator.request(CorrelatedRequest::new(GENERATE, vec![])).await;
        assert!(matches!(result, Err(BridgeError::Transport(_))));
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_channel_is_capability_unavailable() {
        let correlator = Correlator::new(None, Duration::from_secs(10));
        let result = correlator.request(CorrelatedRequest::new(GENERATE, vec![])).await;
        assert_eq!(
            result,
            Err(BridgeError::CapabilityUnavailable("cefMessage.send".into()))
        );
    }

    #[tokio::test]
    async fn test_cancelled_request_deregisters() {
        let (correlator, channel) = correlator();
        let task = {
            let c = correlator.clone();
            tokio::spawn(async move { c.request(CorrelatedRequest::new(GENERATE, vec![])).await })
        };
        channel.wait_for_sent(1).await;
        assert_eq!(correlator.pending_count(), 1);

        task.abort();
        let _ = task.await;
        assert_eq!(correlator.pending_count(), 0);
    }
}
