//! JWT-bearer assertion generation.
//!
//! # Salesforce Requirements
//!
//! - Assertions must use RS256 (RSA Signature with SHA-256)
//! - `iss` is the connected app's consumer key, `sub` the username the app
//!   acts as, `aud` the login host (`https://login.salesforce.com`,
//!   `https://test.salesforce.com` or a My Domain login URL)
//! - `exp` must lie no more than three minutes in the future

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::auth::{JwtClaims, PrivateKey};
use crate::error::AuthError;

/// Longest assertion lifetime Salesforce accepts.
pub const MAX_ASSERTION_LIFETIME_SECS: i64 = 180;

/// A signed assertion ready for the token exchange.
#[derive(Clone)]
pub struct SignedAssertion {
    token: String,
    expires_at: DateTime<Utc>,
}

impl SignedAssertion {
    /// The compact JWS serialization.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl std::fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedAssertion")
            .field("expires_at", &self.expires_at)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// Interface for building and signing JWT-bearer assertions.
///
/// Abstracted so the token exchange can be tested with canned assertions.
pub trait AssertionGenerator: Send + Sync {
    /// Build and sign a new assertion.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AssertionSigningFailed` if signing fails.
    fn generate_assertion(&self) -> Result<SignedAssertion, AuthError>;

    /// How long generated assertions stay valid.
    fn expiration_duration(&self) -> Duration;
}

/// RS256 assertion generator backed by an RSA private key.
pub struct RS256AssertionGenerator {
    encoding_key: EncodingKey,
    issuer: String,
    subject: String,
    audience: String,
    expiration_duration: Duration,
}

impl RS256AssertionGenerator {
    /// Create a generator with the maximum allowed lifetime.
    ///
    /// # Arguments
    ///
    /// * `private_key` - RSA key registered with the connected app
    /// * `issuer` - Connected app consumer key
    /// * `subject` - Username the integration acts as
    /// * `audience` - Login host URL
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidPrivateKey` if the key cannot be used for
    /// RS256 signing.
    pub fn new(
        private_key: &PrivateKey,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key.pem_bytes()).map_err(|e| {
            AuthError::InvalidPrivateKey {
                message: format!("Failed to create encoding key: {e}"),
            }
        })?;

        Ok(Self {
            encoding_key,
            issuer: issuer.into(),
            subject: subject.into(),
            audience: audience.into(),
            expiration_duration: Duration::seconds(MAX_ASSERTION_LIFETIME_SECS),
        })
    }

    /// Use a shorter assertion lifetime.
    ///
    /// # Panics
    ///
    /// Panics if `expiration_duration` exceeds three minutes.
    pub fn with_expiration(mut self, expiration_duration: Duration) -> Self {
        assert!(
            expiration_duration <= Duration::seconds(MAX_ASSERTION_LIFETIME_SECS),
            "assertion lifetime cannot exceed {MAX_ASSERTION_LIFETIME_SECS} seconds"
        );
        self.expiration_duration = expiration_duration;
        self
    }

    fn build_claims(&self, expires_at: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            iss: self.issuer.clone(),
            sub: self.subject.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
        }
    }
}

impl AssertionGenerator for RS256AssertionGenerator {
    fn generate_assertion(&self) -> Result<SignedAssertion, AuthError> {
        let expires_at = Utc::now() + self.expiration_duration;
        let claims = self.build_claims(expires_at);

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key).map_err(
            |e| AuthError::AssertionSigningFailed {
                message: format!("Failed to encode JWT: {e}"),
            },
        )?;

        Ok(SignedAssertion { token, expires_at })
    }

    fn expiration_duration(&self) -> Duration {
        self.expiration_duration
    }
}

impl std::fmt::Debug for RS256AssertionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RS256AssertionGenerator")
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("audience", &self.audience)
            .field("expiration_duration", &self.expiration_duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
