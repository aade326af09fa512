//! Salesforce REST API client.
//!
//! Provides the two operations Order Relay needs: SOQL queries and sObject
//! creation. Every call takes the [`AccessToken`] to use, whose instance URL
//! is the base for the request.

mod query;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::auth::AccessToken;
use crate::error::{ApiError, ErrorDetail};

pub use query::{escape_soql_literal, QueryResponse};

/// Default REST API version.
pub const DEFAULT_API_VERSION: &str = "v61.0";

/// Configuration for REST client behavior.
///
/// # Examples
///
/// ```
/// use salesforce_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_api_version("v59.0")
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(config.api_version, "v59.0");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// REST API version, with the leading `v`
    pub api_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("salesforce-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the API version. A missing `v` prefix is added.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        let version = api_version.into();
        self.api_version = if version.starts_with('v') {
            version
        } else {
            format!("v{version}")
        };
        self
    }
}

/// Result of a successful sObject creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub id: String,

    #[serde(default = "default_success")]
    pub success: bool,

    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

fn default_success() -> bool {
    true
}

/// Client for the Salesforce REST API.
///
/// Cheap to share: the underlying HTTP connection pool is reused by every
/// request.
#[derive(Debug, Clone)]
pub struct SalesforceClient {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl SalesforceClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::HttpClientError` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a SOQL query.
    ///
    /// Only the first batch of results is returned; queries issued by Order
    /// Relay are all `LIMIT 1`.
    #[instrument(skip(self, token), fields(instance_url = %token.instance_url()))]
    pub async fn query<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        soql: &str,
    ) -> Result<QueryResponse<T>, ApiError> {
        let mut url = self.data_url(token, "query")?;
        url.query_pairs_mut().append_pair("q", soql);

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token.token())
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = Self::check_response(response).await?;
        let result: QueryResponse<T> = serde_json::from_value(body)?;
        debug!(total_size = result.total_size, "Query completed");
        Ok(result)
    }

    /// Create a record of type `sobject` with the given field values.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` with Salesforce's error array when the
    /// record is refused.
    #[instrument(skip(self, token, fields), fields(instance_url = %token.instance_url()))]
    pub async fn create(
        &self,
        token: &AccessToken,
        sobject: &str,
        fields: &Value,
    ) -> Result<CreateResponse, ApiError> {
        if sobject.is_empty() || !sobject.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ApiError::InvalidRequest {
                message: format!("invalid sObject name '{sobject}'"),
            });
        }

        let url = self.data_url(token, &format!("sobjects/{sobject}"))?;
        let response = self
            .http_client
            .post(url)
            .bearer_auth(token.token())
            .json(fields)
            .send()
            .await
            .map_err(map_transport_error)?;

        let body = Self::check_response(response).await?;
        let created: CreateResponse = serde_json::from_value(body)?;
        if !created.success {
            warn!(errors = ?created.errors, "Create reported success = false");
            return Err(ApiError::Rejected {
                status: 200,
                errors: created.errors,
                body: Value::Null,
            });
        }

        debug!(id = %created.id, "Record created");
        Ok(created)
    }

    fn data_url(&self, token: &AccessToken, path: &str) -> Result<Url, ApiError> {
        let raw = format!(
            "{}/services/data/{}/{}",
            token.instance_url(),
            self.config.api_version,
            path
        );
        Url::parse(&raw).map_err(|e| ApiError::InvalidRequest {
            message: format!("invalid request URL '{raw}': {e}"),
        })
    }

    async fn check_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Err(ApiError::UnexpectedResponse {
                    message: format!("empty body with status {}", status.as_u16()),
                });
            }
            return Ok(serde_json::from_str(&text)?);
        }

        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        warn!(status = status.as_u16(), body = %body, "Salesforce rejected the request");
        Err(ApiError::rejected(status.as_u16(), body))
    }
}

fn map_transport_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::HttpClientError(error)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
