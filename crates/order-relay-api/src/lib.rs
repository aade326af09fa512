//! # Order Relay HTTP Service
//!
//! HTTP server that receives order webhooks from the marketing platform and
//! relays them into the CRM.
//!
//! This service provides:
//! - `POST /webhooks/{source}`: shared-secret check, then the relay pipeline
//! - `GET /health`: liveness
//! - `POST /auth/salesforce/test`: token exchange smoke test
//! - `GET /metrics`: Prometheus exposition

pub mod config;
pub mod errors;
pub mod metrics;
pub mod responses;

#[cfg(test)]
mod test_support;

pub use config::{LoggingConfig, SalesforceConfig, ServerConfig, ServiceConfig, WebhookConfig};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use metrics::RelayMetrics;
pub use responses::{AuthTestResponse, ErrorResponse, HealthResponse, WebhookResponse};

use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use order_relay_core::OrderRelay;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

/// Header used to correlate log lines for one request.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Webhook authentication
// ============================================================================

/// Checks the shared secret presented with a webhook delivery.
pub trait SecretValidator: Send + Sync {
    /// Header the secret is expected in.
    fn header_name(&self) -> &str;

    /// Whether the presented value matches. `None` means the header was
    /// absent or not valid UTF-8.
    fn validate(&self, presented: Option<&str>) -> bool;
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// The relay pipeline
    pub relay: Arc<OrderRelay>,

    /// Shared-secret check; `None` accepts every delivery
    pub secret_validator: Option<Arc<dyn SecretValidator>>,

    /// Metrics collector for observability
    pub metrics: Arc<RelayMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Arc<ServiceConfig>,
        relay: Arc<OrderRelay>,
        secret_validator: Option<Arc<dyn SecretValidator>>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            config,
            relay,
            secret_validator,
            metrics,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;
    let enable_cors = state.config.server.enable_cors;

    let mut router = Router::new()
        .route("/webhooks/{source}", post(handle_webhook))
        .route("/health", get(handle_health_check))
        .route("/auth/salesforce/test", post(handle_auth_test))
        .route("/metrics", get(metrics_endpoint))
        .layer(DefaultBodyLimit::max(max_body_size));

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server and serve until SIGINT or SIGTERM.
pub async fn start_server(
    config: Arc<ServiceConfig>,
    relay: Arc<OrderRelay>,
    secret_validator: Option<Arc<dyn SecretValidator>>,
) -> Result<(), ServiceError> {
    let metrics = RelayMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {e}"),
        })
    })?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, relay, secret_validator, metrics);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, "Starting HTTP server");

    // In-flight requests complete; new connections are refused once the
    // signal arrives.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Relay one webhook delivery.
///
/// An empty body is treated as `{}`. Body read failures, such as exceeding
/// `server.max_body_size`, keep axum's status but use the JSON error shape.
#[instrument(skip_all, fields(source = %source))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(source): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    state.metrics.webhooks_received.inc();

    if let Some(validator) = &state.secret_validator {
        let presented = headers
            .get(validator.header_name())
            .and_then(|v| v.to_str().ok());
        if !validator.validate(presented) {
            state.metrics.unauthorized_requests.inc();
            return Err(WebhookHandlerError::Unauthorized);
        }
    }

    let body = body.map_err(|rejection| WebhookHandlerError::BodyRejected {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;
    let payload = parse_body(&body)?;

    match state.relay.relay(&source, &payload).await {
        Ok(outcome) => {
            state.metrics.record_success(&outcome);
            Ok(Json(WebhookResponse::from(outcome)))
        }
        Err(e) => {
            state.metrics.record_failure(&e);
            Err(e.into())
        }
    }
}

fn parse_body(body: &[u8]) -> Result<Value, WebhookHandlerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(body).map_err(|e| WebhookHandlerError::InvalidBody {
        message: e.to_string(),
    })
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Exchange a token and report the instance it leads to.
#[instrument(skip(state))]
async fn handle_auth_test(
    State(state): State<AppState>,
) -> Result<Json<AuthTestResponse>, WebhookHandlerError> {
    match state.relay.test_connection().await {
        Ok(check) => {
            info!(instance_url = %check.instance_url, "Token exchange succeeded");
            Ok(Json(AuthTestResponse::from(check)))
        }
        Err(e) => {
            state.metrics.token_exchange_failures.inc();
            Err(e.into())
        }
    }
}

async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// Reuses an inbound `x-correlation-id` or generates one, and echoes it on
/// the response.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration_ms = start.elapsed().as_millis();

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();
    if status.is_server_error() {
        error!(status = %status, duration_ms = %duration_ms, "Request completed with server error");
    } else if status.is_client_error() {
        warn!(status = %status, duration_ms = %duration_ms, "Request completed with client error");
    } else {
        info!(status = %status, duration_ms = %duration_ms, "Request completed");
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
