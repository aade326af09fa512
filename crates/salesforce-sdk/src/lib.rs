//! # Salesforce SDK
//!
//! Software Development Kit for the Salesforce REST API as used by Order Relay.
//!
//! This SDK provides:
//! - Service-account authentication with the OAuth2 JWT-bearer flow
//! - A REST client for SOQL queries and sObject creation
//! - Error types that keep the Salesforce error payload intact for callers
//!
//! # Examples
//!
//! ## Exchanging an assertion for an access token
//!
//! ```rust,no_run
//! use salesforce_sdk::auth::{AuthConfig, JwtBearerAuth, PrivateKey, TokenProvider};
//!
//! # async fn example(pem: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::new("https://login.salesforce.com", "consumer-key", "svc@example.com");
//! let auth = JwtBearerAuth::new(config, PrivateKey::from_pem(pem)?)?;
//!
//! let token = auth.access_token().await?;
//! println!("Connected to {}", token.instance_url());
//! # Ok(())
//! # }
//! ```
//!
//! ## Querying records
//!
//! ```rust,no_run
//! use salesforce_sdk::auth::AccessToken;
//! use salesforce_sdk::client::{escape_soql_literal, ClientConfig, SalesforceClient};
//!
//! # async fn example(token: &AccessToken) -> Result<(), Box<dyn std::error::Error>> {
//! let client = SalesforceClient::new(ClientConfig::default())?;
//! let soql = format!(
//!     "SELECT Id FROM Contact WHERE Email = '{}' LIMIT 1",
//!     escape_soql_literal("o'brien@example.com")
//! );
//! let result = client.query::<serde_json::Value>(token, &soql).await?;
//! println!("{} matching contacts", result.total_size);
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod auth;
pub mod client;
pub mod error;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at crate root for convenience
pub use error::{ApiError, AuthError, ErrorDetail, ValidationError};

pub use auth::{
    AccessToken, AuthConfig, JwtBearerAuth, JwtClaims, PrivateKey, SecretString, TokenProvider,
};
pub use client::{ClientConfig, CreateResponse, QueryResponse, SalesforceClient};
