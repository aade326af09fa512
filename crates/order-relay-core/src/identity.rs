//! Identity resolution: who in the CRM a delivery is about.
//!
//! Resolution looks up a Contact by email and falls back to a Lead. At most
//! one lookup per object type is made, and none at all without an email.

use salesforce_sdk::ApiError;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use crate::crm::CrmGateway;
use crate::order::OrderRecord;
use crate::settings::LeadSettings;

/// Kind of CRM person a record is linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonKind {
    Contact,
    Lead,
    #[default]
    None,
}

/// Result of identity resolution for one delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMatch {
    pub person_id: Option<String>,
    pub person_kind: PersonKind,
    /// Parent Account; only ever set for Contacts
    pub account_id: Option<String>,
}

impl IdentityMatch {
    /// Nobody matched.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contact(id: impl Into<String>, account_id: Option<String>) -> Self {
        Self {
            person_id: Some(id.into()),
            person_kind: PersonKind::Contact,
            account_id,
        }
    }

    pub fn lead(id: impl Into<String>) -> Self {
        Self {
            person_id: Some(id.into()),
            person_kind: PersonKind::Lead,
            account_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.person_id.is_some()
    }
}

/// Resolves order emails to CRM people.
pub struct IdentityResolver<'a> {
    gateway: &'a dyn CrmGateway,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(gateway: &'a dyn CrmGateway) -> Self {
        Self { gateway }
    }

    /// Find the Contact, else the Lead, with this email.
    ///
    /// Without an email no lookup is made and nothing matches.
    #[instrument(skip(self, email), fields(has_email = email.is_some()))]
    pub async fn resolve(&self, email: Option<&str>) -> Result<IdentityMatch, ApiError> {
        let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            debug!("No email; skipping identity lookup");
            return Ok(IdentityMatch::none());
        };

        if let Some(contact) = self.gateway.find_contact_by_email(email).await? {
            debug!(contact_id = %contact.id, "Matched Contact");
            return Ok(IdentityMatch::contact(contact.id, contact.account_id));
        }

        if let Some(lead_id) = self.gateway.find_lead_by_email(email).await? {
            debug!(lead_id = %lead_id, "Matched Lead");
            return Ok(IdentityMatch::lead(lead_id));
        }

        debug!("No Contact or Lead matched");
        Ok(IdentityMatch::none())
    }

    /// Create a Lead for an order whose email matched nobody.
    #[instrument(skip(self, order, email, settings))]
    pub async fn create_lead(
        &self,
        order: &OrderRecord,
        email: &str,
        settings: &LeadSettings,
    ) -> Result<IdentityMatch, ApiError> {
        let fields = lead_fields(order, email, settings);
        let id = self.gateway.create_record("Lead", &fields).await?;
        info!(lead_id = %id, "Created Lead for unmatched email");
        Ok(IdentityMatch::lead(id))
    }
}

/// Field values for a new Lead.
///
/// The last word of the customer's name becomes `LastName`; without a name
/// the email's local part is used, since `LastName` is required.
pub fn lead_fields(order: &OrderRecord, email: &str, settings: &LeadSettings) -> Value {
    let (first_name, last_name) = split_name(order.full_name.as_deref())
        .unwrap_or_else(|| (None, email_local_part(email).to_string()));

    let mut fields = Map::new();
    fields.insert("LastName".to_string(), json!(last_name));
    if let Some(first) = first_name {
        fields.insert("FirstName".to_string(), json!(first));
    }
    fields.insert("Company".to_string(), json!(settings.company));
    fields.insert("Email".to_string(), json!(email));
    if let Some(phone) = &order.phone {
        fields.insert("Phone".to_string(), json!(phone));
    }
    fields.insert("LeadSource".to_string(), json!(settings.lead_source));
    Value::Object(fields)
}

fn split_name(full_name: Option<&str>) -> Option<(Option<String>, String)> {
    let words: Vec<&str> = full_name?.split_whitespace().collect();
    let (last, rest) = words.split_last()?;
    let first = (!rest.is_empty()).then(|| rest.join(" "));
    Some((first, (*last).to_string()))
}

fn email_local_part(email: &str) -> &str {
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => local,
        _ => email,
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
