//! Identity status and backup
//!
//! `identity.get` answers with either the full identity or a bare
//! `{ backedUp: true }` marker. [`IdentityResult`] keeps the two apart.

use super::routes;
use crate::bridge::envelope::{decode, unwrap_envelope};
use crate::bridge::Bridge;
use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityData {
    pub public_key: String,
    pub private_key: String,
    pub address: String,
    #[serde(default)]
    pub backed_up: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IdentityResult {
    /// Identity material still available to the renderer
    Full(IdentityData),
    /// Identity exists and was already backed up; nothing else is returned
    BackedUp,
}

impl IdentityResult {
    /// Discriminate the host reply
    ///
    /// An explicit `kind` field wins. Otherwise the presence of identity
    /// fields decides, never the `backedUp` flag on its own.
    pub fn from_value(value: Value) -> BridgeResult<Self> {
        let value = unwrap_envelope(value)?;
        match value.get("kind").and_then(Value::as_str) {
            Some("full") => return Ok(IdentityResult::Full(decode(value)?)),
            Some("backedUp") => return Ok(IdentityResult::BackedUp),
            Some(other) => {
                return Err(BridgeError::Protocol(format!(
                    "Unknown identity kind '{}'",
                    other
                )))
            }
            None => {}
        }

        if value.get("address").is_some() || value.get("publicKey").is_some() {
            return Ok(IdentityResult::Full(decode(value)?));
        }
        if value.get("backedUp").and_then(Value::as_bool) == Some(true) {
            return Ok(IdentityResult::BackedUp);
        }
        Err(BridgeError::Protocol(
            "Identity reply has neither identity fields nor a backup marker".into(),
        ))
    }

    /// True only for full identity data that has not been backed up
    pub fn needs_backup(&self) -> bool {
        matches!(self, IdentityResult::Full(data) if !data.backed_up)
    }

    pub fn is_backed_up(&self) -> bool {
        !self.needs_backup()
    }
}

#[derive(Clone)]
pub struct IdentityFacade {
    bridge: Arc<Bridge>,
}

impl IdentityFacade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    pub async fn get(&self) -> BridgeResult<IdentityResult> {
        let value = self
            .bridge
            .invoke(Some("identity.get"), Some(routes::IDENTITY_STATUS), vec![])
            .await?;
        IdentityResult::from_value(value)
    }

    pub async fn create(&self) -> BridgeResult<IdentityResult> {
        let value = self
            .bridge
            .invoke(Some("identity.create"), Some(routes::CREATE_IDENTITY), vec![])
            .await?;
        log::info!("Identity created");
        IdentityResult::from_value(value)
    }

    pub async fn mark_backed_up(&self) -> BridgeResult<()> {
        let value = self
            .bridge
            .invoke(
                Some("identity.markBackedUp"),
                Some(routes::MARK_IDENTITY_BACKED_UP),
                vec![],
            )
            .await?;
        unwrap_envelope(value)?;
        log::info!("Identity marked as backed up");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{ready_bridge, reply};
    use crate::bridge::{FnMethod, Installer};
    use serde_json::json;

    #[test]
    fn test_backed_up_marker_needs_no_action() {
        let result = IdentityResult::from_value(json!({"backedUp": true})).unwrap();
        assert_eq!(result, IdentityResult::BackedUp);
        assert!(!result.needs_backup());
    }

    #[test]
    fn test_full_identity_discriminated_by_fields() {
        let result = IdentityResult::from_value(json!({
            "publicKey": "02ab",
            "privateKey": "L1xx",
            "address": "1abc",
            "backedUp": false
        }))
        .unwrap();
        assert!(result.needs_backup());

        // backedUp alone does not make a full identity look like the marker
        let backed = IdentityResult::from_value(json!({
            "publicKey": "02ab",
            "privateKey": "L1xx",
            "address": "1abc",
            "backedUp": true
        }))
        .unwrap();
        assert!(matches!(backed, IdentityResult::Full(_)));
        assert!(!backed.needs_backup());
    }

    #[test]
    fn test_explicit_kind_wins() {
        let result =
            IdentityResult::from_value(json!({"kind": "backedUp", "address": "1abc"})).unwrap();
        assert_eq!(result, IdentityResult::BackedUp);
        assert!(IdentityResult::from_value(json!({"kind": "partial"})).is_err());
    }

    #[test]
    fn test_unrecognised_shapes_are_protocol_errors() {
        assert!(matches!(
            IdentityResult::from_value(json!({"backedUp": false})),
            Err(BridgeError::Protocol(_))
        ));
        assert!(matches!(
            IdentityResult::from_value(json!({"address": 5})),
            Err(BridgeError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_get_direct() {
        let (bridge, _channel) = ready_bridge();
        bridge
            .registry()
            .install(
                "identity.get",
                Arc::new(FnMethod(|_| Ok(json!({"backedUp": true})))),
                Installer::Host,
            )
            .unwrap();

        let identity = IdentityFacade::new(bridge).get().await.unwrap();
        assert_eq!(identity, IdentityResult::BackedUp);
    }

    #[tokio::test]
    async fn test_mark_backed_up_over_event() {
        let (bridge, channel) = ready_bridge();
        let facade = IdentityFacade::new(bridge.clone());
        let task = tokio::spawn(async move { facade.mark_backed_up().await });

        channel.wait_for_sent(1).await;
        assert_eq!(channel.sent()[0].command, "mark_identity_backed_up");
        reply(&bridge, routes::MARK_IDENTITY_BACKED_UP.success, json!({"success": true}));

        task.await.unwrap().unwrap();
    }
}
