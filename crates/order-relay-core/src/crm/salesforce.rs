//! Salesforce implementation of the CRM abstractions.

use async_trait::async_trait;
use salesforce_sdk::auth::{AccessToken, TokenProvider};
use salesforce_sdk::client::{escape_soql_literal, SalesforceClient};
use salesforce_sdk::{ApiError, AuthError};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{ConnectionCheck, ContactMatch, CrmConnector, CrmGateway};

#[derive(Debug, Deserialize)]
struct IdRecord {
    #[serde(rename = "Id")]
    id: String,

    #[serde(rename = "AccountId", default)]
    account_id: Option<String>,
}

/// Connects to Salesforce with a fresh token per request.
pub struct SalesforceConnector {
    tokens: Arc<dyn TokenProvider>,
    client: SalesforceClient,
}

impl SalesforceConnector {
    pub fn new(tokens: Arc<dyn TokenProvider>, client: SalesforceClient) -> Self {
        Self { tokens, client }
    }
}

#[async_trait]
impl CrmConnector for SalesforceConnector {
    async fn connect(&self) -> Result<Box<dyn CrmGateway>, AuthError> {
        let token = self.tokens.access_token().await?;
        Ok(Box::new(SalesforceGateway::new(self.client.clone(), token)))
    }

    async fn test_connection(&self) -> Result<ConnectionCheck, AuthError> {
        let token = self.tokens.access_token().await?;
        Ok(ConnectionCheck {
            instance_url: token.instance_url().to_string(),
            token_preview: token.preview(),
        })
    }
}

/// [`CrmGateway`] over the Salesforce REST API, bound to one access token.
pub struct SalesforceGateway {
    client: SalesforceClient,
    token: AccessToken,
}

impl SalesforceGateway {
    pub fn new(client: SalesforceClient, token: AccessToken) -> Self {
        Self { client, token }
    }

    async fn first_by_email(
        &self,
        fields: &str,
        sobject: &str,
        email: &str,
    ) -> Result<Option<IdRecord>, ApiError> {
        let soql = format!(
            "SELECT {fields} FROM {sobject} WHERE Email = '{}' LIMIT 1",
            escape_soql_literal(email)
        );
        let result = self.client.query::<IdRecord>(&self.token, &soql).await?;
        debug!(sobject, found = result.total_size > 0, "Lookup by email");
        Ok(result.into_first())
    }
}

#[async_trait]
impl CrmGateway for SalesforceGateway {
    #[instrument(skip(self, email))]
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<ContactMatch>, ApiError> {
        let record = self.first_by_email("Id, AccountId", "Contact", email).await?;
        Ok(record.map(|r| ContactMatch {
            id: r.id,
            account_id: r.account_id.filter(|a| !a.is_empty()),
        }))
    }

    #[instrument(skip(self, email))]
    async fn find_lead_by_email(&self, email: &str) -> Result<Option<String>, ApiError> {
        let record = self.first_by_email("Id", "Lead", email).await?;
        Ok(record.map(|r| r.id))
    }

    #[instrument(skip(self, email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<String>, ApiError> {
        let record = self.first_by_email("Id", "User", email).await?;
        Ok(record.map(|r| r.id))
    }

    #[instrument(skip(self, fields))]
    async fn create_record(&self, sobject: &str, fields: &Value) -> Result<String, ApiError> {
        let created = self.client.create(&self.token, sobject, fields).await?;
        Ok(created.id)
    }
}

#[cfg(test)]
#[path = "salesforce_tests.rs"]
mod tests;
