//! Prometheus metrics for the relay.
//!
//! Metrics live on a registry owned by [`RelayMetrics`], so each service
//! instance (and each test) starts from zero.

use order_relay_core::{RelayError, RelayOutcome};
use prometheus::{IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

const NAMESPACE: &str = "order_relay";

/// Relay counters.
pub struct RelayMetrics {
    registry: Registry,

    pub webhooks_received: IntCounter,
    pub webhooks_succeeded: IntCounterVec,
    pub webhooks_failed: IntCounterVec,
    pub unauthorized_requests: IntCounter,
    pub token_exchange_failures: IntCounter,
    pub fallback_retries: IntCounterVec,
    pub relation_failures: IntCounterVec,
}

impl RelayMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let webhooks_received = IntCounter::with_opts(opts(
            "webhooks_received_total",
            "Webhook deliveries received",
        ))?;
        let webhooks_succeeded = IntCounterVec::new(
            opts(
                "webhooks_succeeded_total",
                "Deliveries relayed into the CRM",
            ),
            &["record_type"],
        )?;
        let webhooks_failed = IntCounterVec::new(
            opts("webhooks_failed_total", "Deliveries that failed to relay"),
            &["kind"],
        )?;
        let unauthorized_requests = IntCounter::with_opts(opts(
            "unauthorized_requests_total",
            "Deliveries rejected for a missing or wrong shared secret",
        ))?;
        let token_exchange_failures = IntCounter::with_opts(opts(
            "token_exchange_failures_total",
            "Failed CRM token exchanges",
        ))?;
        let fallback_retries = IntCounterVec::new(
            opts("fallback_retries_total", "Fallback retries taken"),
            &["kind"],
        )?;
        let relation_failures = IntCounterVec::new(
            opts(
                "relation_failures_total",
                "EmailMessage relations that could not be created",
            ),
            &["role"],
        )?;

        registry.register(Box::new(webhooks_received.clone()))?;
        registry.register(Box::new(webhooks_succeeded.clone()))?;
        registry.register(Box::new(webhooks_failed.clone()))?;
        registry.register(Box::new(unauthorized_requests.clone()))?;
        registry.register(Box::new(token_exchange_failures.clone()))?;
        registry.register(Box::new(fallback_retries.clone()))?;
        registry.register(Box::new(relation_failures.clone()))?;

        Ok(Arc::new(Self {
            registry,
            webhooks_received,
            webhooks_succeeded,
            webhooks_failed,
            unauthorized_requests,
            token_exchange_failures,
            fallback_retries,
            relation_failures,
        }))
    }

    pub fn record_success(&self, outcome: &RelayOutcome) {
        self.webhooks_succeeded
            .with_label_values(&[outcome.record.record_type.as_str()])
            .inc();
        for fallback in &outcome.record.fallbacks {
            self.fallback_retries
                .with_label_values(&[fallback.as_str()])
                .inc();
        }
        for effect in outcome.record.side_effects.iter().filter(|e| e.is_rejected()) {
            self.relation_failures
                .with_label_values(&[effect.role.as_str()])
                .inc();
        }
    }

    pub fn record_failure(&self, error: &RelayError) {
        self.webhooks_failed.with_label_values(&[error.kind()]).inc();
        if matches!(error, RelayError::Auth(_)) {
            self.token_exchange_failures.inc();
        }
    }

    /// Text exposition of every metric in the registry.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

fn opts(name: &str, help: &str) -> Opts {
    Opts::new(name, help).namespace(NAMESPACE)
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
