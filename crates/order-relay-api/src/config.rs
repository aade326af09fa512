//! Configuration types for the HTTP service.
//!
//! Every field carries a serde default so partial files and environment
//! overrides deserialize cleanly. Required credentials are checked by
//! [`ServiceConfig::validate`] at startup.

use order_relay_core::RelaySettings;
use salesforce_sdk::client::DEFAULT_API_VERSION;
use salesforce_sdk::{AuthConfig, ClientConfig, PrivateKey, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ConfigError;

/// Header the marketing platform sends the shared secret in.
pub const DEFAULT_SECRET_HEADER: &str = "x-klaviyo-signature";

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Inbound webhook authentication
    pub webhook: WebhookConfig,

    /// CRM connection settings
    pub salesforce: SalesforceConfig,

    /// Relay behaviour
    pub relay: RelaySettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Reject configuration that cannot serve a single delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must not be 0".to_string(),
            });
        }

        self.webhook.validate()?;
        self.salesforce.validate()?;

        self.relay.validate().map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024,
            enable_cors: true,
        }
    }
}

/// Inbound webhook authentication.
///
/// Without a secret every delivery is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Header carrying the shared secret
    pub secret_header: String,

    /// Shared secret expected in `secret_header`
    pub secret: Option<SecretString>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret_header: DEFAULT_SECRET_HEADER.to_string(),
            secret: None,
        }
    }
}

impl WebhookConfig {
    /// The configured secret, if set and not blank.
    pub fn shared_secret(&self) -> Option<&SecretString> {
        self.secret.as_ref().filter(|s| !s.is_empty())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let header = self.secret_header.trim();
        let valid = !header.is_empty()
            && header
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.secret_header '{}' is not a valid header name",
                    self.secret_header
                ),
            });
        }
        Ok(())
    }
}

/// CRM connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesforceConfig {
    /// Login host; also the assertion audience
    pub login_url: String,

    pub api_version: String,

    /// Connected app consumer key
    pub consumer_key: String,

    /// Integration user the relay acts as
    pub username: String,

    /// PEM encoded RSA private key; `\n` escapes are accepted
    pub private_key: SecretString,

    /// Timeout for lookups and creates, in seconds
    pub request_timeout_seconds: u64,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            login_url: "https://login.salesforce.com".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            consumer_key: String::new(),
            username: String::new(),
            private_key: SecretString::default(),
            request_timeout_seconds: 30,
        }
    }
}

impl SalesforceConfig {
    /// Token exchange settings.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(
            self.login_url.trim(),
            self.consumer_key.trim(),
            self.username.trim(),
        )
    }

    /// REST client settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_api_version(self.api_version.trim())
            .with_timeout(Duration::from_secs(self.request_timeout_seconds))
    }

    /// Parse the signing key.
    pub fn signing_key(&self) -> Result<PrivateKey, ConfigError> {
        PrivateKey::from_pem(self.private_key.expose()).map_err(|e| ConfigError::Invalid {
            message: format!("salesforce.private_key: {e}"),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.consumer_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "salesforce.consumer_key".to_string(),
            });
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "salesforce.username".to_string(),
            });
        }
        if self.private_key.is_empty() {
            return Err(ConfigError::Missing {
                key: "salesforce.private_key".to_string(),
            });
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "salesforce.request_timeout_seconds must be positive".to_string(),
            });
        }

        self.auth_config()
            .validate()
            .map_err(|e| ConfigError::Invalid {
                message: format!("salesforce: {e}"),
            })?;
        self.signing_key()?;
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
