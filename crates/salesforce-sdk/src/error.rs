//! Error types for Salesforce SDK operations.
//!
//! This module defines all error types used throughout the SDK. Errors that
//! originate from Salesforce keep the response payload so callers can surface
//! it verbatim to their own clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error code Salesforce returns when a picklist field receives a value that
/// is not part of its restricted value set.
pub const RESTRICTED_PICKLIST_ERROR_CODE: &str = "INVALID_OR_NULL_FOR_RESTRICTED_PICKLIST";

/// Authentication-related errors raised by the JWT-bearer token exchange.
///
/// None of these are retried: a failed exchange fails the caller's whole
/// operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid private key format or data.
    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    /// The assertion could not be signed.
    #[error("JWT assertion signing failed: {message}")]
    AssertionSigningFailed { message: String },

    /// The OAuth token endpoint refused the signed assertion.
    ///
    /// Typical causes are an expired or mismatched key, clock skew, a wrong
    /// audience, or a user that has not pre-authorized the connected app.
    #[error("Token endpoint rejected the assertion: {status} - {error}")]
    TokenRejected {
        status: u16,
        error: String,
        description: Option<String>,
        body: Value,
    },

    /// The token exchange did not complete within its time budget.
    #[error("Token exchange timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Network connectivity or transport error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The token endpoint answered with a body that is not a token response.
    #[error("Invalid token response: {message}")]
    InvalidTokenResponse { message: String },
}

impl AuthError {
    /// JSON payload describing this error for diagnostic responses.
    ///
    /// Rejections return the token endpoint's own body; everything else is
    /// rendered as its display string.
    pub fn error_payload(&self) -> Value {
        match self {
            Self::TokenRejected { body, .. } if !body.is_null() => body.clone(),
            _ => Value::String(self.to_string()),
        }
    }
}

/// A single entry of a Salesforce REST error response.
///
/// Salesforce reports failures as a JSON array of these objects, for example
/// `[{"message": "...", "errorCode": "REQUIRED_FIELD_MISSING", "fields": ["LastName"]}]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "errorCode")]
    pub error_code: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub fields: Vec<String>,
}

/// Errors during Salesforce REST API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Salesforce answered with a non-success status.
    ///
    /// `errors` holds the parsed error entries (empty when the body was not in
    /// the standard format) and `body` the raw payload.
    #[error("Salesforce rejected the request with status {status}: {}", summarize(.errors))]
    Rejected {
        status: u16,
        errors: Vec<ErrorDetail>,
        body: Value,
    },

    /// Request to Salesforce timed out.
    #[error("Request timeout")]
    Timeout,

    /// The request could not be built.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Salesforce answered successfully but the body was not what the
    /// operation expects.
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Failed to parse JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl ApiError {
    /// Build a [`ApiError::Rejected`] from a status and raw response body.
    pub fn rejected(status: u16, body: Value) -> Self {
        let errors = serde_json::from_value::<Vec<ErrorDetail>>(body.clone()).unwrap_or_default();
        Self::Rejected {
            status,
            errors,
            body,
        }
    }

    /// Whether Salesforce rejected the request with the given error code.
    pub fn has_error_code(&self, code: &str) -> bool {
        match self {
            Self::Rejected { errors, .. } => errors.iter().any(|e| e.error_code == code),
            _ => false,
        }
    }

    /// Whether this is a restricted picklist rejection.
    pub fn is_restricted_picklist(&self) -> bool {
        self.has_error_code(RESTRICTED_PICKLIST_ERROR_CODE)
    }

    /// Whether Salesforce itself refused the request (4xx response).
    ///
    /// Transport failures and server errors are not rejections.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { status, .. } if (400..500).contains(status))
    }

    /// JSON payload describing this error for diagnostic responses.
    ///
    /// Rejections return Salesforce's own body verbatim.
    pub fn error_payload(&self) -> Value {
        match self {
            Self::Rejected { body, .. } if !body.is_null() => body.clone(),
            _ => Value::String(self.to_string()),
        }
    }
}

fn summarize(errors: &[ErrorDetail]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.error_code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Input validation errors.
///
/// These errors occur when validating configuration data such as keys and
/// endpoint URLs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing.
    #[error("Required field missing: {field}")]
    Required { field: String },

    /// A field has an invalid format.
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
