//! Task writer.

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{info, instrument, warn};

use super::{CrmWriteResult, FallbackKind, RecordType};
use crate::crm::CrmGateway;
use crate::identity::IdentityMatch;
use crate::message::{task_description, RenderedMessage};
use crate::order::OrderRecord;
use crate::settings::RelaySettings;
use crate::RelayError;

/// Field values for a Task.
///
/// `Type` is written only when `task_type` is given; `WhoId` only when the
/// identity resolved to a person.
pub fn task_fields(
    subject: &str,
    task_type: Option<&str>,
    settings: &RelaySettings,
    order: &OrderRecord,
    identity: &IdentityMatch,
    message: &RenderedMessage,
) -> Value {
    let mut fields = Map::new();
    fields.insert("Subject".to_string(), json!(subject));
    if let Some(task_type) = task_type {
        fields.insert("Type".to_string(), json!(task_type));
    }
    fields.insert("Status".to_string(), json!(settings.task.status));
    fields.insert("Priority".to_string(), json!(settings.task.priority));
    fields.insert(
        "ActivityDate".to_string(),
        json!(Utc::now().format("%Y-%m-%d").to_string()),
    );
    fields.insert(
        "Description".to_string(),
        json!(task_description(order, &message.lead)),
    );
    if let Some(email) = &order.email {
        fields.insert("Email".to_string(), json!(email));
    }
    if let Some(phone) = &order.phone {
        fields.insert("Phone".to_string(), json!(phone));
    }
    if let Some(person_id) = &identity.person_id {
        fields.insert("WhoId".to_string(), json!(person_id));
    }
    Value::Object(fields)
}

#[instrument(skip_all, fields(person_kind = ?identity.person_kind))]
pub(super) async fn write_task(
    gateway: &dyn CrmGateway,
    settings: &RelaySettings,
    order: &OrderRecord,
    identity: &IdentityMatch,
    message: &RenderedMessage,
) -> Result<CrmWriteResult, RelayError> {
    let subject = settings.task.subject.as_str();
    let fields = task_fields(
        subject,
        settings.task_type(),
        settings,
        order,
        identity,
        message,
    );

    let mut fallbacks = Vec::new();
    let (record_id, subject_used) = match gateway.create_record("Task", &fields).await {
        Ok(id) => (id, subject),
        Err(e) if e.is_restricted_picklist() => {
            let fallback_subject = settings.task.fallback_subject.as_str();
            warn!(
                subject,
                fallback_subject,
                error = %e,
                "Task picklist value rejected; retrying with fallback subject and no Type"
            );
            fallbacks.push(FallbackKind::RestrictedPicklist);

            let fields = task_fields(fallback_subject, None, settings, order, identity, message);
            let id = gateway.create_record("Task", &fields).await?;
            (id, fallback_subject)
        }
        Err(e) => return Err(e.into()),
    };

    info!(task_id = %record_id, subject = subject_used, "Created Task");

    Ok(CrmWriteResult {
        record_id,
        record_type: RecordType::Task,
        linked_person_id: identity.person_id.clone(),
        subject_used: Some(subject_used.to_string()),
        side_effects: Vec::new(),
        fallbacks,
    })
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
