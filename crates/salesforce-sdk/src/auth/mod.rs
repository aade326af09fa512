//! Authentication types and interfaces for Salesforce service-account access.
//!
//! Order Relay authenticates to Salesforce with the OAuth2 JWT-bearer flow:
//! a short-lived assertion is signed with the connected app's RSA key and
//! exchanged at the login host for a bearer token plus the org's instance URL.
//!
//! Tokens are never cached. Every call to [`TokenProvider::access_token`]
//! builds, signs and exchanges a fresh assertion.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::{AuthError, ValidationError};

pub mod jwt;
pub mod tokens;

pub use jwt::{AssertionGenerator, RS256AssertionGenerator, SignedAssertion};
pub use tokens::{AuthConfig, JwtBearerAuth, JWT_BEARER_GRANT_TYPE};

// ============================================================================
// Secrets
// ============================================================================

/// A string secret that is wiped from memory on drop.
///
/// `Debug` and `Serialize` never reveal the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Expose the secret value.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"<REDACTED>\"")
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("<REDACTED>")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// ============================================================================
// Private key
// ============================================================================

/// RSA private key used to sign JWT-bearer assertions.
///
/// Accepts PKCS#1 (`BEGIN RSA PRIVATE KEY`) and PKCS#8 (`BEGIN PRIVATE KEY`)
/// PEM documents. Keys stored in single-line environment variables usually
/// carry literal `\n` sequences instead of line breaks; those are unescaped
/// before parsing.
#[derive(Clone)]
pub struct PrivateKey {
    pem: SecretString,
}

impl PrivateKey {
    /// Parse and validate a PEM encoded RSA private key.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the input is blank or is not a PKCS#1 or
    /// PKCS#8 RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, ValidationError> {
        let normalized = Zeroizing::new(pem.trim().replace("\\n", "\n"));
        if normalized.is_empty() {
            return Err(ValidationError::Required {
                field: "private_key".to_string(),
            });
        }

        let pkcs1 = RsaPrivateKey::from_pkcs1_pem(&normalized);
        if pkcs1.is_err() && RsaPrivateKey::from_pkcs8_pem(&normalized).is_err() {
            return Err(ValidationError::InvalidFormat {
                field: "private_key".to_string(),
                message: "expected a PKCS#1 or PKCS#8 PEM encoded RSA private key".to_string(),
            });
        }

        Ok(Self {
            pem: SecretString::new(normalized.as_str()),
        })
    }

    /// PEM bytes, with escapes already resolved.
    pub fn pem_bytes(&self) -> &[u8] {
        self.pem.expose().as_bytes()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("pem", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// Claims and tokens
// ============================================================================

/// Claims of a JWT-bearer assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Issuer: the connected app's consumer key
    pub iss: String,
    /// Subject: the service account username
    pub sub: String,
    /// Audience: the login host URL
    pub aud: String,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Bearer token obtained from the token exchange.
///
/// Holds the org's instance URL, which is the base for every subsequent REST
/// call made with this token.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    instance_url: String,
    issued_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, instance_url: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token),
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            issued_at: Utc::now(),
        }
    }

    /// The bearer token value.
    pub fn token(&self) -> &str {
        self.token.expose()
    }

    /// The org's instance URL, without a trailing slash.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// A short, non-usable preview of the token for diagnostics.
    ///
    /// Returns the first ten characters followed by an ellipsis.
    pub fn preview(&self) -> String {
        let head: String = self.token().chars().take(10).collect();
        format!("{head}…")
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("instance_url", &self.instance_url)
            .field("issued_at", &self.issued_at)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Source of bearer tokens for REST calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when the assertion cannot be signed or the token
    /// endpoint refuses it, times out, or answers with an unusable body.
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
