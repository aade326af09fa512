//! The relay pipeline for one webhook delivery.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::crm::{ConnectionCheck, CrmConnector};
use crate::identity::{IdentityMatch, IdentityResolver};
use crate::message::MessageRenderer;
use crate::order::{OrderDataSource, WebhookEnvelope};
use crate::settings::RelaySettings;
use crate::writer::{CrmWriteResult, RecordWriter};
use crate::{RelayError, RelayResult};

/// Everything that happened for one delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    pub source: String,
    pub identity: IdentityMatch,
    pub record: CrmWriteResult,
    /// Whether a Lead was created for an unmatched email
    pub lead_created: bool,
    pub order_data_source: OrderDataSource,
}

/// Runs normalization, authentication, identity resolution and record
/// creation for each delivery.
///
/// Holds only immutable state; share one instance across requests.
pub struct OrderRelay {
    connector: Arc<dyn CrmConnector>,
    renderer: MessageRenderer,
    settings: Arc<RelaySettings>,
}

impl OrderRelay {
    /// Build the relay.
    ///
    /// # Errors
    ///
    /// Fails if the settings are invalid or the message template does not
    /// compile.
    pub fn new(connector: Arc<dyn CrmConnector>, settings: Arc<RelaySettings>) -> RelayResult<Self> {
        settings.validate()?;
        let renderer = MessageRenderer::new(settings.default_body.clone())?;
        Ok(Self {
            connector,
            renderer,
            settings,
        })
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Relay one delivery into the CRM.
    #[instrument(skip(self, payload), fields(source = %source))]
    pub async fn relay(&self, source: &str, payload: &Value) -> Result<RelayOutcome, RelayError> {
        let envelope = WebhookEnvelope::from_payload(payload);
        let order = &envelope.order;
        debug!(
            order_data_source = ?order.order_data_source,
            has_email = order.email.is_some(),
            item_count = order.items.len(),
            "Normalized delivery"
        );

        let message = self.renderer.render(&envelope)?;

        let gateway = self.connector.connect().await?;
        let resolver = IdentityResolver::new(gateway.as_ref());

        let mut identity = resolver.resolve(order.email.as_deref()).await?;
        let mut lead_created = false;
        if !identity.is_resolved() && self.settings.leads.create_missing {
            if let Some(email) = order.email.as_deref() {
                identity = resolver
                    .create_lead(order, email, &self.settings.leads)
                    .await?;
                lead_created = true;
            }
        }

        let record = RecordWriter::new(gateway.as_ref(), &self.settings)
            .write(order, &identity, &message)
            .await?;

        info!(
            record_id = %record.record_id,
            record_type = %record.record_type,
            person_kind = ?identity.person_kind,
            lead_created,
            "Relayed delivery"
        );

        Ok(RelayOutcome {
            source: source.to_string(),
            identity,
            record,
            lead_created,
            order_data_source: order.order_data_source,
        })
    }

    /// Exchange a token without touching any records.
    pub async fn test_connection(&self) -> Result<ConnectionCheck, RelayError> {
        Ok(self.connector.test_connection().await?)
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
