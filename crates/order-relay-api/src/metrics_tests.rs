use super::*;
use order_relay_core::{
    CrmWriteResult, FallbackKind, IdentityMatch, OrderDataSource, RecordType, RelationRole,
    SideEffect,
};
use salesforce_sdk::{ApiError, AuthError};
use serde_json::json;

fn outcome(record: CrmWriteResult) -> RelayOutcome {
    RelayOutcome {
        source: "klaviyo".to_string(),
        identity: IdentityMatch::none(),
        record,
        lead_created: false,
        order_data_source: OrderDataSource::Absent,
    }
}

#[test]
fn test_fresh_registry_per_instance() {
    let first = RelayMetrics::new().unwrap();
    first.webhooks_received.inc();

    let second = RelayMetrics::new().unwrap();

    assert_eq!(first.webhooks_received.get(), 1);
    assert_eq!(second.webhooks_received.get(), 0);
}

#[test]
fn test_record_success_counts_fallbacks_and_relation_failures() {
    let metrics = RelayMetrics::new().unwrap();

    metrics.record_success(&outcome(CrmWriteResult {
        record_id: "02s1".to_string(),
        record_type: RecordType::EmailMessage,
        linked_person_id: Some("003A".to_string()),
        subject_used: Some("Order #1".to_string()),
        side_effects: vec![
            SideEffect::created(RelationRole::To, "0Er1", "RelatedTo"),
            SideEffect::rejected(RelationRole::From, json!("Request timeout")),
        ],
        fallbacks: vec![FallbackKind::RelationType],
    }));

    assert_eq!(
        metrics
            .webhooks_succeeded
            .with_label_values(&["EmailMessage"])
            .get(),
        1
    );
    assert_eq!(
        metrics
            .fallback_retries
            .with_label_values(&["relation_type"])
            .get(),
        1
    );
    assert_eq!(metrics.relation_failures.with_label_values(&["from"]).get(), 1);
    assert_eq!(metrics.relation_failures.with_label_values(&["to"]).get(), 0);
}

#[test]
fn test_record_failure_by_kind() {
    let metrics = RelayMetrics::new().unwrap();

    metrics.record_failure(&RelayError::from(AuthError::Timeout { seconds: 15 }));
    metrics.record_failure(&RelayError::from(ApiError::Timeout));

    assert_eq!(metrics.webhooks_failed.with_label_values(&["auth"]).get(), 1);
    assert_eq!(metrics.webhooks_failed.with_label_values(&["crm"]).get(), 1);
    assert_eq!(metrics.token_exchange_failures.get(), 1);
}

#[test]
fn test_render_uses_namespace() {
    let metrics = RelayMetrics::new().unwrap();
    metrics.webhooks_received.inc();
    metrics.unauthorized_requests.inc();

    let text = metrics.render().unwrap();

    assert!(text.contains("order_relay_webhooks_received_total 1"));
    assert!(text.contains("order_relay_unauthorized_requests_total 1"));
}
