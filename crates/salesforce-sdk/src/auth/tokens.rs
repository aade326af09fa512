//! JWT-bearer token exchange and the [`TokenProvider`] implementation.
//!
//! The exchange posts a freshly signed assertion to
//! `{login_url}/services/oauth2/token` and returns the bearer token together
//! with the org's instance URL. There is no caching and no retry.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{AccessToken, AssertionGenerator, PrivateKey, RS256AssertionGenerator, TokenProvider};
use crate::error::{AuthError, ValidationError};

/// OAuth2 grant type for the JWT-bearer flow.
pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Configuration for the token exchange.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Login host, also used as the assertion audience
    pub login_url: String,

    /// Connected app consumer key (assertion issuer)
    pub consumer_key: String,

    /// Username the integration acts as (assertion subject)
    pub username: String,

    /// Time budget for the whole exchange
    pub token_timeout: Duration,

    /// User agent for token requests
    pub user_agent: String,
}

impl AuthConfig {
    pub fn new(
        login_url: impl Into<String>,
        consumer_key: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            login_url: login_url.into().trim_end_matches('/').to_string(),
            consumer_key: consumer_key.into(),
            username: username.into(),
            token_timeout: Duration::from_secs(15),
            user_agent: concat!("salesforce-sdk/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Check that all required values are present and the login URL parses.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.consumer_key.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "consumer_key".to_string(),
            });
        }
        if self.username.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "username".to_string(),
            });
        }
        Url::parse(&self.login_url).map_err(|e| ValidationError::InvalidFormat {
            field: "login_url".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Token endpoint derived from the login URL.
    pub fn token_url(&self) -> String {
        format!("{}/services/oauth2/token", self.login_url)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    error_description: Option<String>,
}

/// Token provider for the OAuth2 JWT-bearer flow.
pub struct JwtBearerAuth<G: AssertionGenerator = RS256AssertionGenerator> {
    generator: G,
    http_client: reqwest::Client,
    config: AuthConfig,
}

impl JwtBearerAuth<RS256AssertionGenerator> {
    /// Create a provider that signs assertions with `private_key`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the key cannot be used for signing or the HTTP
    /// client cannot be built.
    pub fn new(config: AuthConfig, private_key: PrivateKey) -> Result<Self, AuthError> {
        let generator = RS256AssertionGenerator::new(
            &private_key,
            config.consumer_key.clone(),
            config.username.clone(),
            config.login_url.clone(),
        )?;
        Self::with_generator(config, generator)
    }
}

impl<G: AssertionGenerator> JwtBearerAuth<G> {
    /// Create a provider around a custom assertion generator.
    pub fn with_generator(config: AuthConfig, generator: G) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.token_timeout)
            .build()
            .map_err(|e| AuthError::NetworkError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            generator,
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn map_transport_error(&self, error: reqwest::Error) -> AuthError {
        if error.is_timeout() {
            AuthError::Timeout {
                seconds: self.config.token_timeout.as_secs(),
            }
        } else {
            AuthError::NetworkError(error.to_string())
        }
    }
}

#[async_trait]
impl<G: AssertionGenerator + 'static> TokenProvider for JwtBearerAuth<G> {
    #[instrument(skip(self), fields(login_url = %self.config.login_url, username = %self.config.username))]
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.generator.generate_assertion()?;

        let response = self
            .http_client
            .post(self.config.token_url())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.token()),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            let payload: Value = serde_json::from_str(&body).unwrap_or(Value::String(body));
            let details: TokenErrorResponse =
                serde_json::from_value(payload.clone()).unwrap_or_default();
            warn!(
                status = status.as_u16(),
                error = %details.error,
                "Token endpoint rejected the assertion"
            );
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
                error: details.error,
                description: details.error_description,
                body: payload,
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidTokenResponse {
                message: e.to_string(),
            })?;

        if token.access_token.is_empty() || token.instance_url.is_empty() {
            return Err(AuthError::InvalidTokenResponse {
                message: "token response is missing access_token or instance_url".to_string(),
            });
        }

        debug!(instance_url = %token.instance_url, "Obtained access token");
        Ok(AccessToken::new(token.access_token, token.instance_url))
    }
}

#[cfg(test)]
#[path = "tokens_tests.rs"]
mod tests;
