//! CRM record creation.
//!
//! A delivery produces either a Task or an EmailMessage with its relations,
//! selected by [`WriterKind`]. Both variants carry a single fallback retry
//! for a known rejection; nothing else is retried.

use serde::Serialize;
use serde_json::Value;

use crate::crm::CrmGateway;
use crate::identity::IdentityMatch;
use crate::message::RenderedMessage;
use crate::order::OrderRecord;
use crate::settings::{RelaySettings, WriterKind};
use crate::RelayError;

mod email_message;
mod task;

pub use email_message::{email_message_fields, relation_fields};
pub use task::task_fields;

/// CRM object created for a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordType {
    Task,
    EmailMessage,
}

impl RecordType {
    /// The sObject API name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::EmailMessage => "EmailMessage",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of an EmailMessage a relation links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationRole {
    To,
    From,
}

impl RelationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::To => "to",
            Self::From => "from",
        }
    }
}

/// Result of a secondary write that never fails the delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideEffect {
    pub role: RelationRole,
    #[serde(flatten)]
    pub outcome: SideEffectOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SideEffectOutcome {
    Created {
        id: String,
        #[serde(rename = "relationType")]
        relation_type: String,
    },
    /// The CRM refused the relation; `error` is its payload
    Rejected { error: Value },
    Skipped { reason: String },
}

impl SideEffect {
    pub fn created(role: RelationRole, id: impl Into<String>, relation_type: &str) -> Self {
        Self {
            role,
            outcome: SideEffectOutcome::Created {
                id: id.into(),
                relation_type: relation_type.to_string(),
            },
        }
    }

    pub fn rejected(role: RelationRole, error: Value) -> Self {
        Self {
            role,
            outcome: SideEffectOutcome::Rejected { error },
        }
    }

    pub fn skipped(role: RelationRole, reason: impl Into<String>) -> Self {
        Self {
            role,
            outcome: SideEffectOutcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, SideEffectOutcome::Rejected { .. })
    }
}

/// A fallback retry that was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Task retried with the fallback subject and no Type
    RestrictedPicklist,
    /// Recipient relation retried with the generic relation type
    RelationType,
}

impl FallbackKind {
    /// Label used in metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestrictedPicklist => "restricted_picklist",
            Self::RelationType => "relation_type",
        }
    }
}

/// What was written for one delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct CrmWriteResult {
    pub record_id: String,
    pub record_type: RecordType,
    pub linked_person_id: Option<String>,
    pub subject_used: Option<String>,
    pub side_effects: Vec<SideEffect>,
    pub fallbacks: Vec<FallbackKind>,
}

/// Writes the configured record type for a delivery.
pub struct RecordWriter<'a> {
    gateway: &'a dyn CrmGateway,
    settings: &'a RelaySettings,
}

impl<'a> RecordWriter<'a> {
    pub fn new(gateway: &'a dyn CrmGateway, settings: &'a RelaySettings) -> Self {
        Self { gateway, settings }
    }

    /// Create the CRM record for a normalized order.
    ///
    /// # Errors
    ///
    /// Fails when the primary record cannot be created. Relation failures
    /// are reported in [`CrmWriteResult::side_effects`] instead.
    pub async fn write(
        &self,
        order: &OrderRecord,
        identity: &IdentityMatch,
        message: &RenderedMessage,
    ) -> Result<CrmWriteResult, RelayError> {
        match self.settings.writer {
            WriterKind::Task => {
                task::write_task(self.gateway, self.settings, order, identity, message).await
            }
            WriterKind::EmailMessage => {
                email_message::write_email_message(
                    self.gateway,
                    self.settings,
                    order,
                    identity,
                    message,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
