//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use order_relay_core::RelayError;
use serde_json::Value;
use tracing::{error, warn};

use crate::responses::ErrorResponse;

/// Webhook handler errors with HTTP status code mapping
///
/// - `401 Unauthorized`: the shared secret was missing or wrong
/// - `400 Bad Request`: the body is not JSON
/// - `413 Payload Too Large` and other body read failures: the status axum
///   reports for the rejection
/// - `500 Internal Server Error`: authentication against the CRM or a CRM
///   write failed; the CRM's own error payload is returned
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    #[error("unauthorized")]
    Unauthorized,

    /// Request body could not be parsed
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },

    /// Request body could not be read, e.g. it exceeds the size limit
    #[error("Request body rejected: {message}")]
    BodyRejected { status: StatusCode, message: String },

    /// Relay pipeline failure
    #[error("Relay failed: {0}")]
    Relay(#[from] RelayError),
}

impl WebhookHandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidBody { .. } => StatusCode::BAD_REQUEST,
            Self::BodyRejected { status, .. } => *status,
            Self::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            Self::Unauthorized => {
                warn!("Rejected webhook with missing or wrong shared secret");
                Value::String("unauthorized".to_string())
            }
            Self::InvalidBody { message } => {
                warn!(error = %message, "Rejected webhook with invalid body");
                Value::String(self.to_string())
            }
            Self::BodyRejected { status, message } => {
                warn!(status = %status, error = %message, "Rejected unreadable webhook body");
                Value::String(self.to_string())
            }
            Self::Relay(e) => {
                error!(error = %e, kind = e.kind(), "Relay failed");
                e.error_payload()
            }
        };

        (status, Json(ErrorResponse::new(error))).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
