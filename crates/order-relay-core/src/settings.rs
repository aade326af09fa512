//! Relay behaviour settings.
//!
//! These are deserialized as the `relay` section of the service
//! configuration. Every field has a default so an empty section is valid.

use serde::{Deserialize, Serialize};

use crate::RelayError;

/// Which kind of CRM record a delivery produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterKind {
    #[default]
    Task,
    EmailMessage,
}

/// Settings for Task records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Value for the Subject picklist
    pub subject: String,

    /// Value for the Type picklist; omitted from the record when unset
    #[serde(rename = "type")]
    pub task_type: Option<String>,

    /// Subject used when the CRM rejects a restricted picklist value
    pub fallback_subject: String,

    pub status: String,
    pub priority: String,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            subject: "Order".to_string(),
            task_type: Some("Klaviyo".to_string()),
            fallback_subject: "Task".to_string(),
            status: "Completed".to_string(),
            priority: "Normal".to_string(),
        }
    }
}

/// Settings for EmailMessage records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Sender address; also used to find the integration User
    pub sender_address: Option<String>,

    pub sender_name: Option<String>,

    /// Relation type linking the message to the recipient
    pub to_relation_type: String,

    /// Relation type retried when the recipient relation is rejected
    pub fallback_relation_type: String,

    /// Relation type linking the message to the sending User
    pub from_relation_type: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            sender_address: None,
            sender_name: None,
            to_relation_type: "ToAddress".to_string(),
            fallback_relation_type: "RelatedTo".to_string(),
            from_relation_type: "FromAddress".to_string(),
        }
    }
}

/// Settings for creating Leads when nobody matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadSettings {
    pub create_missing: bool,

    /// Company written on created Leads (the field is required)
    pub company: String,

    pub lead_source: String,
}

impl Default for LeadSettings {
    fn default() -> Self {
        Self {
            create_missing: false,
            company: "Unknown".to_string(),
            lead_source: "Klaviyo".to_string(),
        }
    }
}

/// Complete relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub writer: WriterKind,

    /// Lead sentence used when a delivery carries no `body`
    pub default_body: String,

    pub task: TaskSettings,
    pub email: EmailSettings,
    pub leads: LeadSettings,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            writer: WriterKind::default(),
            default_body: "New order submission from Klaviyo".to_string(),
            task: TaskSettings::default(),
            email: EmailSettings::default(),
            leads: LeadSettings::default(),
        }
    }
}

impl RelaySettings {
    /// Reject combinations that would fail on every delivery.
    pub fn validate(&self) -> Result<(), RelayError> {
        if self.task.subject.trim().is_empty() {
            return Err(RelayError::configuration("relay.task.subject must not be empty"));
        }
        if self.task.fallback_subject.trim().is_empty() {
            return Err(RelayError::configuration(
                "relay.task.fallback_subject must not be empty",
            ));
        }

        if self.writer == WriterKind::EmailMessage {
            let sender = self.email.sender_address.as_deref().unwrap_or("");
            if sender.trim().is_empty() {
                return Err(RelayError::configuration(
                    "relay.email.sender_address is required when relay.writer is email_message",
                ));
            }
            if !sender.contains('@') {
                return Err(RelayError::configuration(format!(
                    "relay.email.sender_address '{sender}' is not an email address"
                )));
            }
        }

        if self.leads.create_missing && self.leads.company.trim().is_empty() {
            return Err(RelayError::configuration(
                "relay.leads.company must not be empty when relay.leads.create_missing is set",
            ));
        }

        Ok(())
    }

    /// The configured Task type, if it is set and not blank.
    pub fn task_type(&self) -> Option<&str> {
        self.task
            .task_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
