//! Bridge to the native host
//!
//! [`Bridge`] is the single dependency handed to facades and state holders.
//! It bundles the capability registry (direct calls), the correlator (command
//! channel plus out-of-band responses) and the readiness gate.

pub mod correlator;
pub mod envelope;
pub mod readiness;
pub mod registry;
pub mod stdio;

pub use correlator::{CommandChannel, CorrelatedRequest, Correlator};
pub use envelope::{CommandResult, HostEvent, OutboundMessage, Route, Surface};
pub use readiness::Readiness;
pub use registry::{CapabilityRegistry, FnMethod, HostMethod, InstallOutcome, Installer};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Capacity of the unsolicited event fan-out
const EVENT_CAPACITY: usize = 64;

/// Fire-and-forget capability backed by a host command
pub struct CommandMethod {
    channel: Arc<dyn CommandChannel>,
    command: &'static str,
}

impl CommandMethod {
    pub fn new(channel: Arc<dyn CommandChannel>, command: &'static str) -> Self {
        Self { channel, command }
    }
}

#[async_trait]
impl HostMethod for CommandMethod {
    async fn invoke(&self, args: Vec<Value>) -> BridgeResult<Value> {
        self.channel
            .send(OutboundMessage::signal(self.command, args))?;
        Ok(Value::Null)
    }
}

pub struct Bridge {
    config: BridgeConfig,
    registry: CapabilityRegistry,
    correlator: Correlator,
    readiness: Readiness,
    events: broadcast::Sender<HostEvent>,
}

impl Bridge {
    /// Build a bridge over `channel`; `None` models a host without `cefMessage`
    pub fn new(config: BridgeConfig, channel: Option<Arc<dyn CommandChannel>>) -> Self {
        let registry = CapabilityRegistry::new();
        if let Some(channel) = &channel {
            install_shell_defaults(&registry, channel.clone());
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            correlator: Correlator::new(channel, config.request_timeout()),
            config,
            registry,
            readiness: Readiness::new(),
            events,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Subscribe to unsolicited host events (auth requests, panel triggers)
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }

    /// Feed one inbound host event into the bridge
    pub fn handle_event(&self, event: HostEvent) {
        match &event {
            HostEvent::SystemsReady => self.readiness.mark_ready(),
            HostEvent::Callback { .. } | HostEvent::Response { .. } => {
                if self.correlator.dispatch(&event) {
                    return;
                }
            }
            HostEvent::CapabilityInstalled { path } => {
                log::info!("Host injected capability {}", path);
            }
            HostEvent::AuthRequest { .. } | HostEvent::TriggerPanel { .. } => {}
        }
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Poll until the host is ready or `capability` shows up in the registry
    pub async fn probe_ready(&self, capability: Option<&str>) -> BridgeResult<u32> {
        self.readiness
            .probe(
                self.config.readiness_attempts,
                self.config.readiness_interval(),
                || capability.map_or(false, |path| self.registry.contains(path)),
            )
            .await
    }

    /// Call `direct` if the host injected it, otherwise go through `route`
    ///
    /// Correlated calls wait for host readiness first.
    pub async fn invoke(
        &self,
        direct: Option<&str>,
        route: Option<Route>,
        args: Vec<Value>,
    ) -> BridgeResult<Value> {
        self.invoke_with_timeout(direct, route, args, None).await
    }

    pub async fn invoke_with_timeout(
        &self,
        direct: Option<&str>,
        route: Option<Route>,
        args: Vec<Value>,
        timeout: Option<Duration>,
    ) -> BridgeResult<Value> {
        if let Some(method) = direct.and_then(|path| self.registry.resolve(path)) {
            return method.invoke(args).await;
        }

        let Some(route) = route else {
            return Err(BridgeError::unavailable(direct.unwrap_or("capability")));
        };
        if !self.correlator.has_channel() {
            return Err(BridgeError::unavailable(direct.unwrap_or(route.command)));
        }

        self.probe_ready(None).await?;

        let mut request = CorrelatedRequest::new(route, args);
        request.timeout = timeout;
        self.correlator.request(request).await
    }

    /// Fire-and-forget command; never waits for a response
    pub fn signal(&self, command: &str, args: Vec<Value>) -> BridgeResult<()> {
        log::debug!("signal {}", command);
        self.correlator.send(OutboundMessage::signal(command, args))
    }
}

fn install_shell_defaults(registry: &CapabilityRegistry, channel: Arc<dyn CommandChannel>) {
    let method = Arc::new(CommandMethod::new(channel, "navigate"));
    if let Err(e) = registry.install("navigation.navigate", method, Installer::Shell) {
        log::warn!("Could not install navigation fallback: {}", e);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    const STATUS: Route = Route {
        command: "wallet_status_check",
        success: Surface::Callback("onWalletStatusResponse"),
        error: Some(Surface::Callback("onWalletStatusError")),
    };

    #[tokio::test]
    async fn test_direct_method_preferred_over_route() {
        let (bridge, channel) = ready_bridge();
        bridge
            .registry()
            .install(
                "wallet.getStatus",
                Arc::new(FnMethod(|_| Ok(json!({"exists": true, "needsBackup": false})))),
                Installer::Host,
            )
            .unwrap();

        let value = bridge
            .invoke(Some("wallet.getStatus"), Some(STATUS), vec![])
            .await
            .unwrap();
        assert_eq!(value["exists"], true);
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_correlated_fallback() {
        let (bridge, channel) = ready_bridge();
        let task = {
            let b = bridge.clone();
            tokio::spawn(async move { b.invoke(Some("wallet.getStatus"), Some(STATUS), vec![]).await })
        };
        channel.wait_for_sent(1).await;
        reply(&bridge, STATUS.success, json!({"exists": false, "needsBackup": false}));

        assert_eq!(task.await.unwrap().unwrap()["exists"], false);
    }

    #[tokio::test]
    async fn test_no_transport_is_capability_unavailable() {
        let bridge = Bridge::new(BridgeConfig::default(), None);
        let err = bridge
            .invoke(Some("wallet.getStatus"), Some(STATUS), vec![])
            .await
            .unwrap_err();
        assert_eq!(err, BridgeError::unavailable("wallet.getStatus"));

        let err = bridge.invoke(Some("brc100.status"), None, vec![]).await.unwrap_err();
        assert_eq!(err, BridgeError::unavailable("brc100.status"));
        assert!(bridge.signal("overlay_show", vec![]).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_correlated_call_waits_for_readiness() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = Bridge::new(
            BridgeConfig::default(),
            Some(channel.clone() as Arc<dyn CommandChannel>),
        );

        let err = bridge.invoke(None, Some(STATUS), vec![]).await.unwrap_err();
        assert_eq!(err, BridgeError::NotReady { attempts: 40 });
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_shell_navigation_fallback_sends_command() {
        let (bridge, channel) = ready_bridge();
        assert_eq!(
            bridge.registry().installer_of("navigation.navigate"),
            Some(Installer::Shell)
        );

        bridge
            .registry()
            .call("navigation.navigate", vec![json!("https://example.com")])
            .await
            .unwrap();
        assert_eq!(channel.sent()[0].command, "navigate");
        assert_eq!(channel.sent()[0].args, vec![json!("https://example.com")]);
    }

    #[tokio::test]
    async fn test_unsolicited_events_reach_subscribers() {
        let (bridge, _channel) = ready_bridge();
        let mut rx = bridge.subscribe();

        bridge.handle_event(HostEvent::TriggerPanel {
            panel: "settings".into(),
        });
        bridge.handle_event(HostEvent::Callback {
            name: "onAddressGenerated".into(),
            payload: json!({}),
            request_id: None,
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            HostEvent::TriggerPanel {
                panel: "settings".into()
            }
        );
        // Unmatched callbacks are forwarded too
        assert!(matches!(rx.recv().await.unwrap(), HostEvent::Callback { .. }));
    }
}
