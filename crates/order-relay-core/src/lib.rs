//! # Order Relay Core
//!
//! Core business logic for relaying marketing-platform order webhooks into a
//! CRM.
//!
//! One delivery flows through:
//! 1. [`order::normalize`] - raw body to canonical [`order::OrderRecord`]
//! 2. [`crm::CrmConnector::connect`] - fresh token exchange
//! 3. [`identity::IdentityResolver`] - Contact, then Lead, lookup by email
//! 4. [`writer::RecordWriter`] - Task or EmailMessage creation
//!
//! [`relay::OrderRelay`] runs the whole sequence.
//!
//! ## Architecture
//!
//! Business logic depends only on the [`crm::CrmGateway`] and
//! [`crm::CrmConnector`] traits; the Salesforce implementations are injected
//! by the service at startup.

use salesforce_sdk::{ApiError, AuthError};
use serde_json::Value;
use thiserror::Error;

pub mod crm;
pub mod identity;
pub mod message;
pub mod order;
pub mod relay;
pub mod settings;
pub mod writer;

pub use identity::{IdentityMatch, IdentityResolver, PersonKind};
pub use message::{MessageRenderer, RenderedMessage};
pub use order::{normalize, OrderDataSource, OrderRecord, WebhookEnvelope};
pub use relay::{OrderRelay, RelayOutcome};
pub use settings::{RelaySettings, WriterKind};
pub use writer::{
    CrmWriteResult, FallbackKind, RecordType, RecordWriter, RelationRole, SideEffect,
    SideEffectOutcome,
};

/// Standard result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors that fail a relay request.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("CRM authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("CRM request failed: {0}")]
    Crm(#[from] ApiError),

    #[error("Message rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error("Invalid relay configuration: {message}")]
    Configuration { message: String },
}

impl RelayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// JSON payload describing the failure for the webhook response.
    ///
    /// CRM and token endpoint errors are passed through verbatim.
    pub fn error_payload(&self) -> Value {
        match self {
            Self::Auth(e) => e.error_payload(),
            Self::Crm(e) => e.error_payload(),
            other => Value::String(other.to_string()),
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Crm(_) => "crm",
            Self::Template(_) => "template",
            Self::Configuration { .. } => "configuration",
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
