//! Wire types shared with the native host
//!
//! Outbound traffic is always a command name plus ordered JSON arguments.
//! Inbound traffic arrives on one of two surfaces: a named global callback
//! (`window.onAddressGenerated(payload)`) or a `cefMessageResponse` event whose
//! `detail.message` names the response and `detail.args[0]` holds a JSON string.

use crate::error::{BridgeError, BridgeResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a correlated response is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Named global callback receiving the payload directly
    Callback(&'static str),
    /// `cefMessageResponse` event carrying a JSON string in `args[0]`
    Event(&'static str),
}

impl Surface {
    pub fn name(&self) -> &'static str {
        match self {
            Surface::Callback(name) | Surface::Event(name) => name,
        }
    }

    /// Whether an inbound host event was delivered on this surface
    pub fn matches(&self, event: &HostEvent) -> bool {
        match (self, event) {
            (Surface::Callback(expected), HostEvent::Callback { name, .. }) => expected == name,
            (Surface::Event(expected), HostEvent::Response { message, .. }) => expected == message,
            _ => false,
        }
    }
}

/// A correlated command: what to send and where the answer shows up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub command: &'static str,
    pub success: Surface,
    pub error: Option<Surface>,
}

/// Command sent to the host (`cefMessage.send(command, args)`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub command: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// Correlation id echoed back by hosts that support it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<u64>,
}

impl OutboundMessage {
    /// Fire-and-forget signal with no correlation id
    pub fn signal(command: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            command: command.into(),
            args,
            request_id: None,
        }
    }
}

/// Anything the host pushes into the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    /// `window.<name>(payload)`
    Callback {
        name: String,
        #[serde(default)]
        payload: Value,
        #[serde(default, rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<u64>,
    },
    /// `cefMessageResponse` custom event
    Response {
        message: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<u64>,
    },
    /// `allSystemsReady` one-shot signal
    SystemsReady,
    /// A capability the host injected after startup (`bitcoinBrowser.<path>`)
    CapabilityInstalled { path: String },
    /// BRC-100 authentication request posted to the auth overlay
    AuthRequest {
        #[serde(default)]
        payload: Value,
    },
    /// `window.triggerPanel(name)` from the overlay window manager
    TriggerPanel { panel: String },
}

impl HostEvent {
    pub fn request_id(&self) -> Option<u64> {
        match self {
            HostEvent::Callback { request_id, .. } | HostEvent::Response { request_id, .. } => {
                *request_id
            }
            _ => None,
        }
    }

    /// Success payload as JSON; event payloads are parsed from their string form
    pub fn success_payload(&self) -> BridgeResult<Value> {
        match self {
            HostEvent::Callback { payload, .. } => Ok(payload.clone()),
            HostEvent::Response { message, args, .. } => {
                let raw = args.first().ok_or_else(|| {
                    BridgeError::Protocol(format!("'{}' carried no payload", message))
                })?;
                serde_json::from_str(raw).map_err(|e| {
                    BridgeError::Protocol(format!("Failed to parse '{}' payload: {}", message, e))
                })
            }
            other => Err(BridgeError::Protocol(format!(
                "{:?} is not a response",
                other
            ))),
        }
    }

    /// Error message as reported by the host, used verbatim
    pub fn error_message(&self) -> String {
        match self {
            HostEvent::Callback { payload, .. } => message_from_value(payload),
            HostEvent::Response { args, .. } => match args.first() {
                Some(raw) => match serde_json::from_str::<Value>(raw) {
                    Ok(value) => message_from_value(&value),
                    Err(_) => raw.clone(),
                },
                None => "Native host reported an error".to_string(),
            },
            other => format!("{:?}", other),
        }
    }
}

fn message_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Value::Null => "Native host reported an error".to_string(),
        other => other.to_string(),
    }
}

// ============================================================================
// Response Envelopes
// ============================================================================

/// `{ success, data?, error? }` envelope used by host APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Collapse into a `Result`, treating a missing `data` on success as a protocol error
    pub fn into_result(self) -> BridgeResult<T> {
        if !self.success {
            return Err(BridgeError::Native(
                self.error
                    .unwrap_or_else(|| "Native host reported failure".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| BridgeError::Protocol("successful response carried no data".into()))
    }
}

/// Strip a `{ success, data }` wrapper if present; `success: false` becomes a native error
pub fn unwrap_envelope(value: Value) -> BridgeResult<Value> {
    if let Value::Object(map) = &value {
        match map.get("success") {
            Some(Value::Bool(false)) => {
                let message = map
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("Native host reported failure");
                return Err(BridgeError::Native(message.to_string()));
            }
            Some(Value::Bool(true)) => {
                if let Some(data) = map.get("data") {
                    return Ok(data.clone());
                }
            }
            _ => {}
        }
    }
    Ok(value)
}

/// Decode a host response into a typed value
pub fn decode<T: DeserializeOwned>(value: Value) -> BridgeResult<T> {
    let value = unwrap_envelope(value)?;
    serde_json::from_value(value)
        .map_err(|e| BridgeError::Protocol(format!("Unexpected response shape: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_surface_matching() {
        let callback = HostEvent::Callback {
            name: "onAddressGenerated".into(),
            payload: json!({}),
            request_id: None,
        };
        let event = HostEvent::Response {
            message: "onAddressGenerated".into(),
            args: vec![],
            request_id: None,
        };
        assert!(Surface::Callback("onAddressGenerated").matches(&callback));
        assert!(!Surface::Event("onAddressGenerated").matches(&callback));
        assert!(Surface::Event("onAddressGenerated").matches(&event));
    }

    #[test]
    fn test_event_payload_is_parsed_from_string() {
        let event = HostEvent::Response {
            message: "mark_identity_backed_up_response".into(),
            args: vec![r#"{"success":true}"#.into()],
            request_id: None,
        };
        assert_eq!(event.success_payload().unwrap(), json!({"success": true}));
    }

    #[test]
    fn test_malformed_event_payload_is_protocol_error() {
        let event = HostEvent::Response {
            message: "sign_transaction_response".into(),
            args: vec!["{oops".into()],
            request_id: None,
        };
        assert!(matches!(event.success_payload(), Err(BridgeError::Protocol(_))));

        let empty = HostEvent::Response {
            message: "sign_transaction_response".into(),
            args: vec![],
            request_id: None,
        };
        assert!(matches!(empty.success_payload(), Err(BridgeError::Protocol(_))));
    }

    #[test]
    fn test_error_message_extraction() {
        let plain = HostEvent::Callback {
            name: "onAddressError".into(),
            payload: json!("wallet locked"),
            request_id: None,
        };
        assert_eq!(plain.error_message(), "wallet locked");

        let wrapped = HostEvent::Response {
            message: "x_error".into(),
            args: vec![r#"{"error":"no utxos"}"#.into()],
            request_id: None,
        };
        assert_eq!(wrapped.error_message(), "no utxos");

        let raw = HostEvent::Response {
            message: "x_error".into(),
            args: vec!["disk full".into()],
            request_id: None,
        };
        assert_eq!(raw.error_message(), "disk full");
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(
            unwrap_envelope(json!({"success": true, "data": {"address": "1abc"}})).unwrap(),
            json!({"address": "1abc"})
        );
        assert_eq!(
            unwrap_envelope(json!({"success": true, "txid": "ff"})).unwrap(),
            json!({"success": true, "txid": "ff"})
        );
        assert_eq!(
            unwrap_envelope(json!({"success": false, "error": "Insufficient funds"})),
            Err(BridgeError::Native("Insufficient funds".into()))
        );
    }

    #[test]
    fn test_command_result_into_result() {
        let ok: CommandResult<u32> = CommandResult::ok(7);
        assert_eq!(ok.into_result().unwrap(), 7);

        let failed: CommandResult<u32> = CommandResult::err("session expired");
        assert_eq!(
            failed.into_result(),
            Err(BridgeError::Native("session expired".into()))
        );

        let empty: CommandResult<u32> = CommandResult {
            success: true,
            data: None,
            error: None,
        };
        assert!(matches!(empty.into_result(), Err(BridgeError::Protocol(_))));
    }

    #[test]
    fn test_command_result_payload_needs_no_default() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Session {
            token: String,
        }

        let failed: CommandResult<Session> =
            serde_json::from_value(json!({"success": false, "error": "denied"})).unwrap();
        assert_eq!(failed.data, None);
        assert_eq!(failed.into_result(), Err(BridgeError::Native("denied".into())));

        let ok: CommandResult<Session> =
            serde_json::from_value(json!({"success": true, "data": {"token": "t1"}})).unwrap();
        assert_eq!(ok.into_result().unwrap().token, "t1");
    }

    #[test]
    fn test_host_event_wire_format() {
        let line = r#"{"type":"response","message":"get_transaction_history_response","args":["[]"],"requestId":4}"#;
        let event: HostEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.request_id(), Some(4));

        let ready: HostEvent = serde_json::from_str(r#"{"type":"systemsReady"}"#).unwrap();
        assert_eq!(ready, HostEvent::SystemsReady);

        let out = OutboundMessage::signal("overlay_show", vec![]);
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"command": "overlay_show", "args": []})
        );
    }
}
