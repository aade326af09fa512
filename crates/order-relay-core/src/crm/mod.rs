//! CRM access abstractions.
//!
//! Business logic talks to the CRM through [`CrmGateway`], a narrow interface
//! over the handful of lookups and creates the relay performs. A
//! [`CrmConnector`] authenticates and hands out a gateway bound to a fresh
//! token for one request.

use async_trait::async_trait;
use salesforce_sdk::{ApiError, AuthError};
use serde::Serialize;
use serde_json::Value;

pub mod salesforce;

pub use salesforce::{SalesforceConnector, SalesforceGateway};

/// A Contact found by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMatch {
    pub id: String,
    /// Parent Account, when the Contact has one
    pub account_id: Option<String>,
}

/// Outcome of a successful authentication smoke test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub instance_url: String,
    /// First characters of the token; never the full value
    pub token_preview: String,
}

/// Lookups and record creation against the CRM.
///
/// Each method performs exactly one outbound call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmGateway: Send + Sync {
    /// First Contact whose email matches exactly.
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<ContactMatch>, ApiError>;

    /// Id of the first Lead whose email matches exactly.
    async fn find_lead_by_email(&self, email: &str) -> Result<Option<String>, ApiError>;

    /// Id of the first User whose email matches exactly.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<String>, ApiError>;

    /// Create a record and return its id.
    async fn create_record(&self, sobject: &str, fields: &Value) -> Result<String, ApiError>;
}

/// Authenticates against the CRM.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmConnector: Send + Sync {
    /// Obtain a gateway bound to a freshly issued token.
    async fn connect(&self) -> Result<Box<dyn CrmGateway>, AuthError>;

    /// Perform a token exchange and report where it leads.
    async fn test_connection(&self) -> Result<ConnectionCheck, AuthError>;
}
