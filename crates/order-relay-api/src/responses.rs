//! Response bodies for the HTTP endpoints.
//!
//! Field names are camelCase on the wire.

use order_relay_core::crm::ConnectionCheck;
use order_relay_core::{PersonKind, RecordType, RelayOutcome, SideEffect};
use serde::Serialize;
use serde_json::Value;

/// Successful webhook response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub ok: bool,
    pub source: String,
    pub record_id: String,
    pub record_type: RecordType,
    pub linked_person_id: Option<String>,
    pub linked_person_kind: PersonKind,
    pub account_id: Option<String>,
    pub subject_used: Option<String>,
    pub side_effects: Vec<SideEffect>,
}

impl From<RelayOutcome> for WebhookResponse {
    fn from(outcome: RelayOutcome) -> Self {
        Self {
            ok: true,
            source: outcome.source,
            record_id: outcome.record.record_id,
            record_type: outcome.record.record_type,
            linked_person_id: outcome.record.linked_person_id,
            linked_person_kind: outcome.identity.person_kind,
            account_id: outcome.identity.account_id,
            subject_used: outcome.record.subject_used,
            side_effects: outcome.record.side_effects,
        }
    }
}

/// Failure body: `{ok: false, error}`.
///
/// `error` is a message or the CRM's own error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: Value,
}

impl ErrorResponse {
    pub fn new(error: Value) -> Self {
        Self { ok: false, error }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Token exchange smoke test result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTestResponse {
    pub ok: bool,
    pub instance_url: String,
    /// First characters of the token only
    pub token_preview: String,
}

impl From<ConnectionCheck> for AuthTestResponse {
    fn from(check: ConnectionCheck) -> Self {
        Self {
            ok: true,
            instance_url: check.instance_url,
            token_preview: check.token_preview,
        }
    }
}
