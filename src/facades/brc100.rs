//! BRC-100 identity, authentication and sessions
//!
//! Direct calls only: every method lives under `brc100.*` and answers with the
//! `{ success, data, error }` envelope. Approval of an incoming auth request is
//! a pair of fire-and-forget commands.

use super::routes;
use crate::bridge::{Bridge, CommandResult};
use crate::error::{BridgeError, BridgeResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const NAMESPACE: &str = "brc100";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brc100Status {
    pub available: bool,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub app_id: String,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallenge {
    pub challenge: String,
    pub timestamp: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthAnswer {
    pub challenge: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub app_id: String,
    pub session_id: String,
    pub expires_at: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

// ============================================================================
// Incoming auth requests
// ============================================================================

/// Authentication prompt built from the host's `brc100_auth_request`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPrompt {
    pub domain: String,
    pub app_id: String,
    pub purpose: String,
    pub method: String,
    pub endpoint: String,
    /// Request body, shown as the challenge
    pub challenge: String,
    /// Minutes
    pub session_duration: u32,
    pub permissions: Vec<String>,
}

impl AuthPrompt {
    /// Parse `{ domain, method, endpoint, body }`
    pub fn from_payload(payload: &Value) -> BridgeResult<Self> {
        let domain = payload
            .get("domain")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| BridgeError::Protocol("Auth request without a domain".into()))?;
        let text = |key: &str| match payload.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            domain: domain.to_string(),
            app_id: domain.to_string(),
            purpose: "Authentication Request".to_string(),
            method: text("method"),
            endpoint: text("endpoint"),
            challenge: text("body"),
            session_duration: 30,
            permissions: vec!["Access identity certificate".to_string()],
        })
    }
}

/// The user's answer to an [`AuthPrompt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthDecision {
    pub approved: bool,
    /// Remember the domain so future requests skip the prompt
    pub whitelist: bool,
}

impl AuthDecision {
    pub fn approve(whitelist: bool) -> Self {
        Self {
            approved: true,
            whitelist,
        }
    }

    pub fn reject() -> Self {
        Self {
            approved: false,
            whitelist: false,
        }
    }
}

#[derive(Clone)]
pub struct Brc100Facade {
    bridge: Arc<Bridge>,
}

impl Brc100Facade {
    pub fn new(bridge: Arc<Bridge>) -> Self {
        Self { bridge }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, data: Option<Value>) -> BridgeResult<T> {
        if !self.bridge.registry().has_namespace(NAMESPACE) {
            return Err(BridgeError::unavailable("BRC-100 API"));
        }
        let path = format!("{}.{}", NAMESPACE, method);
        if !self.bridge.registry().contains(&path) {
            return Err(BridgeError::unavailable(format!("BRC-100 method '{}'", method)));
        }

        let args = data.into_iter().collect();
        let value = self.bridge.invoke(Some(&path), None, args).await?;
        let envelope: CommandResult<T> = serde_json::from_value(value)
            .map_err(|e| BridgeError::Protocol(format!("Malformed BRC-100 reply: {}", e)))?;
        envelope.into_result()
    }

    pub async fn status(&self) -> BridgeResult<Brc100Status> {
        self.call("status", None).await
    }

    /// False on any failure, including a missing namespace
    pub async fn is_available(&self) -> bool {
        match self.status().await {
            Ok(status) => status.available,
            Err(e) => {
                log::debug!("BRC-100 unavailable: {}", e);
                false
            }
        }
    }

    pub async fn generate_challenge(&self, request: &ChallengeRequest) -> BridgeResult<AuthChallenge> {
        self.call("generateChallenge", Some(serde_json::to_value(request)?))
            .await
    }

    pub async fn authenticate(&self, answer: &AuthAnswer) -> BridgeResult<AuthOutcome> {
        let outcome: AuthOutcome = self
            .call("authenticate", Some(serde_json::to_value(answer)?))
            .await?;
        if !outcome.success {
            return Err(BridgeError::Native(
                outcome
                    .error
                    .unwrap_or_else(|| "Authentication failed".to_string()),
            ));
        }
        Ok(outcome)
    }

    pub async fn create_session(&self, app_id: &str, permissions: &[String]) -> BridgeResult<SessionData> {
        self.call(
            "createSession",
            Some(json!({ "appId": app_id, "permissions": permissions })),
        )
        .await
    }

    pub async fn validate_session(&self, session_id: &str) -> BridgeResult<bool> {
        self.call("validateSession", Some(json!({ "sessionId": session_id })))
            .await
    }

    pub async fn revoke_session(&self, session_id: &str) -> BridgeResult<bool> {
        let revoked = self
            .call("revokeSession", Some(json!({ "sessionId": session_id })))
            .await?;
        log::info!("Revoked BRC-100 session {}", session_id);
        Ok(revoked)
    }

    /// Send the user's decision back to the host's HTTP interceptor
    ///
    /// Whitelisting is requested before the approval so the interceptor sees
    /// the domain as trusted when it resumes.
    pub fn respond(&self, prompt: &AuthPrompt, decision: AuthDecision) -> BridgeResult<()> {
        if decision.approved && decision.whitelist {
            let entry = json!({ "domain": prompt.domain, "permanent": true });
            self.bridge
                .signal(routes::ADD_DOMAIN_TO_WHITELIST, vec![json!(entry.to_string())])?;
        }

        let reply = json!({ "approved": decision.approved, "whitelist": decision.whitelist });
        self.bridge
            .signal(routes::BRC100_AUTH_RESPONSE, vec![json!(reply.to_string())])?;
        log::info!(
            "BRC-100 auth for {} {}",
            prompt.domain,
            if decision.approved { "approved" } else { "rejected" }
        );
        Ok(())
    }
}
