//! # Order Relay Service
//!
//! Binary entry point for the Order Relay HTTP service.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Wires the Salesforce connector into the relay pipeline
//! - Starts the HTTP server from order-relay-api

mod config_loader;
mod secret_validator;

use anyhow::Context;
use order_relay_api::{start_server, LoggingConfig, SecretValidator, ServiceConfig, ServiceError};
use order_relay_core::crm::SalesforceConnector;
use order_relay_core::OrderRelay;
use salesforce_sdk::{JwtBearerAuth, SalesforceClient};
use secret_validator::SharedSecretValidator;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let loaded = config_loader::load_config();

    // Logging comes up before the load result is inspected so that a broken
    // configuration is still reported through it.
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    info!("Starting Order Relay Service");

    let service_config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(
                error = %e,
                "Could not load service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    let relay = match build_relay(&service_config) {
        Ok(relay) => relay,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to build relay pipeline; aborting");
            std::process::exit(3);
        }
    };

    let secret_validator = build_secret_validator(&service_config);

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        writer = ?service_config.relay.writer,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(Arc::new(service_config), relay, secret_validator).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

// ============================================================================
// Private helpers
// ============================================================================

fn init_tracing(logging: &LoggingConfig) {
    let level = logging.level.trim();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "order_relay_service={level},order_relay_api={level},order_relay_core={level},\
             salesforce_sdk={level},tower_http=debug"
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Token provider, REST client and connector behind one relay.
fn build_relay(config: &ServiceConfig) -> anyhow::Result<Arc<OrderRelay>> {
    let salesforce = &config.salesforce;

    let tokens = JwtBearerAuth::new(salesforce.auth_config(), salesforce.signing_key()?)
        .context("Failed to build token provider")?;
    let client = SalesforceClient::new(salesforce.client_config())
        .context("Failed to build Salesforce client")?;

    let connector = SalesforceConnector::new(Arc::new(tokens), client);
    let relay = OrderRelay::new(Arc::new(connector), Arc::new(config.relay.clone()))
        .context("Failed to build relay")?;

    Ok(Arc::new(relay))
}

fn build_secret_validator(config: &ServiceConfig) -> Option<Arc<dyn SecretValidator>> {
    match config.webhook.shared_secret() {
        Some(secret) => {
            info!(header = %config.webhook.secret_header, "Shared-secret check enabled");
            Some(Arc::new(SharedSecretValidator::new(
                config.webhook.secret_header.clone(),
                secret.clone(),
            )))
        }
        None => {
            warn!("No webhook secret configured; every delivery will be accepted");
            None
        }
    }
}
