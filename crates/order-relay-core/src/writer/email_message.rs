//! EmailMessage writer.
//!
//! The message itself must be created for the delivery to succeed. The
//! recipient ("to") and sender ("from") relations are attempted afterwards,
//! independently, and only ever reported.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use super::{CrmWriteResult, FallbackKind, RecordType, RelationRole, SideEffect};
use crate::crm::CrmGateway;
use crate::identity::{IdentityMatch, PersonKind};
use crate::message::RenderedMessage;
use crate::order::OrderRecord;
use crate::settings::{EmailSettings, RelaySettings};
use crate::RelayError;

const RELATION_SOBJECT: &str = "EmailMessageRelation";

/// Sent-status code for EmailMessage.
const STATUS_SENT: &str = "3";

/// Field values for an EmailMessage.
pub fn email_message_fields(
    sender: &str,
    email: &EmailSettings,
    order: &OrderRecord,
    identity: &IdentityMatch,
    message: &RenderedMessage,
) -> Value {
    let mut fields = Map::new();
    fields.insert("Subject".to_string(), json!(message.subject));
    fields.insert("HtmlBody".to_string(), json!(message.body_html));
    fields.insert("TextBody".to_string(), json!(message.body_text));
    fields.insert("FromAddress".to_string(), json!(sender));
    if let Some(name) = email.sender_name.as_deref().filter(|n| !n.trim().is_empty()) {
        fields.insert("FromName".to_string(), json!(name));
    }
    if let Some(to) = &order.email {
        fields.insert("ToAddress".to_string(), json!(to));
    }
    fields.insert("Status".to_string(), json!(STATUS_SENT));
    fields.insert(
        "MessageDate".to_string(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    fields.insert("Incoming".to_string(), json!(false));
    if identity.person_kind == PersonKind::Contact {
        if let Some(account_id) = &identity.account_id {
            fields.insert("RelatedToId".to_string(), json!(account_id));
        }
    }
    Value::Object(fields)
}

/// Field values for an EmailMessageRelation.
pub fn relation_fields(message_id: &str, relation_id: &str, relation_type: &str) -> Value {
    json!({
        "EmailMessageId": message_id,
        "RelationId": relation_id,
        "RelationType": relation_type,
    })
}

#[instrument(skip_all, fields(person_kind = ?identity.person_kind))]
pub(super) async fn write_email_message(
    gateway: &dyn CrmGateway,
    settings: &RelaySettings,
    order: &OrderRecord,
    identity: &IdentityMatch,
    message: &RenderedMessage,
) -> Result<CrmWriteResult, RelayError> {
    let email = &settings.email;
    let sender = email
        .sender_address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            RelayError::configuration("relay.email.sender_address is required for EmailMessage")
        })?;

    let fields = email_message_fields(sender, email, order, identity, message);
    let message_id = gateway.create_record(RecordType::EmailMessage.as_str(), &fields).await?;
    info!(email_message_id = %message_id, "Created EmailMessage");

    let mut fallbacks = Vec::new();
    let to = relate_recipient(gateway, email, &message_id, identity, &mut fallbacks).await;
    let from = relate_sender(gateway, email, &message_id, sender).await;

    Ok(CrmWriteResult {
        record_id: message_id,
        record_type: RecordType::EmailMessage,
        linked_person_id: identity.person_id.clone(),
        subject_used: Some(message.subject.clone()),
        side_effects: vec![to, from],
        fallbacks,
    })
}

/// Link the message to the resolved person, retrying once with the generic
/// relation type when the CRM rejects the specific one.
async fn relate_recipient(
    gateway: &dyn CrmGateway,
    email: &EmailSettings,
    message_id: &str,
    identity: &IdentityMatch,
    fallbacks: &mut Vec<FallbackKind>,
) -> SideEffect {
    let Some(person_id) = identity.person_id.as_deref() else {
        debug!("No resolved person; skipping recipient relation");
        return SideEffect::skipped(RelationRole::To, "no person resolved");
    };

    let relation_type = email.to_relation_type.as_str();
    let fields = relation_fields(message_id, person_id, relation_type);
    let error = match gateway.create_record(RELATION_SOBJECT, &fields).await {
        Ok(id) => return SideEffect::created(RelationRole::To, id, relation_type),
        Err(e) if e.is_rejection() => e,
        Err(e) => {
            warn!(error = %e, "Recipient relation failed");
            return SideEffect::rejected(RelationRole::To, e.error_payload());
        }
    };

    let fallback_type = email.fallback_relation_type.as_str();
    warn!(
        relation_type,
        fallback_type,
        error = %error,
        "Recipient relation rejected; retrying with fallback relation type"
    );
    fallbacks.push(FallbackKind::RelationType);

    let fields = relation_fields(message_id, person_id, fallback_type);
    match gateway.create_record(RELATION_SOBJECT, &fields).await {
        Ok(id) => SideEffect::created(RelationRole::To, id, fallback_type),
        Err(e) => {
            warn!(error = %e, "Recipient relation failed after fallback");
            SideEffect::rejected(RelationRole::To, e.error_payload())
        }
    }
}

/// Link the message to the integration User that sends it.
async fn relate_sender(
    gateway: &dyn CrmGateway,
    email: &EmailSettings,
    message_id: &str,
    sender: &str,
) -> SideEffect {
    let user_id = match gateway.find_user_by_email(sender).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            warn!("No User matches the sender address; skipping sender relation");
            return SideEffect::skipped(RelationRole::From, "no user matches the sender address");
        }
        Err(e) => {
            warn!(error = %e, "Sender User lookup failed");
            return SideEffect::rejected(RelationRole::From, e.error_payload());
        }
    };

    let relation_type = email.from_relation_type.as_str();
    let fields = relation_fields(message_id, &user_id, relation_type);
    match gateway.create_record(RELATION_SOBJECT, &fields).await {
        Ok(id) => SideEffect::created(RelationRole::From, id, relation_type),
        Err(e) => {
            warn!(error = %e, "Sender relation failed");
            SideEffect::rejected(RelationRole::From, e.error_payload())
        }
    }
}

#[cfg(test)]
#[path = "email_message_tests.rs"]
mod tests;
