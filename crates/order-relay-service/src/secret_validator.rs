//! Shared-secret [`SecretValidator`] for the service binary.

use order_relay_api::SecretValidator;
use salesforce_sdk::SecretString;
use subtle::ConstantTimeEq;

/// Accepts a delivery when the header value equals the configured secret.
///
/// The comparison runs in constant time over the bytes of both values.
pub struct SharedSecretValidator {
    header: String,
    secret: SecretString,
}

impl SharedSecretValidator {
    pub fn new(header: impl Into<String>, secret: SecretString) -> Self {
        Self {
            header: header.into().trim().to_ascii_lowercase(),
            secret,
        }
    }
}

impl std::fmt::Debug for SharedSecretValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretValidator")
            .field("header", &self.header)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

impl SecretValidator for SharedSecretValidator {
    fn header_name(&self) -> &str {
        &self.header
    }

    fn validate(&self, presented: Option<&str>) -> bool {
        match presented {
            Some(value) => value
                .as_bytes()
                .ct_eq(self.secret.expose().as_bytes())
                .into(),
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "secret_validator_tests.rs"]
mod tests;
