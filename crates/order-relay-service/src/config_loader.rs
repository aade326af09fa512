//! Layered configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//!  1. `/etc/order-relay/service.yaml`: system-wide defaults
//!  2. `./config/service.yaml`: deployment-local override
//!  3. the file named by `RELAY_CONFIG_FILE`, which must exist when set
//!  4. `RELAY__`-prefixed variables, e.g. `RELAY__SERVER__PORT=9090`
//!  5. the flat variables of older deployments (`SF_CLIENT_ID`, `PORT`, ...)
//!
//! Absent files are fine; a malformed file or a value that cannot be coerced
//! to its field's type is an error.

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use config::builder::DefaultState;
use order_relay_api::ServiceConfig;

pub const SYSTEM_CONFIG_FILE: &str = "/etc/order-relay/service";
pub const LOCAL_CONFIG_FILE: &str = "config/service";
pub const CONFIG_FILE_ENV: &str = "RELAY_CONFIG_FILE";
pub const ENV_PREFIX: &str = "RELAY";

/// Flat variables and the keys they override.
const LEGACY_VARIABLES: &[(&str, &str)] = &[
    ("SF_LOGIN_URL", "salesforce.login_url"),
    ("SF_API_VERSION", "salesforce.api_version"),
    ("SF_CLIENT_ID", "salesforce.consumer_key"),
    ("SF_USERNAME", "salesforce.username"),
    ("SF_PRIVATE_KEY", "salesforce.private_key"),
    ("KLAVIYO_SECRET", "webhook.secret"),
    ("TASK_SUBJECT", "relay.task.subject"),
    ("TASK_TYPE", "relay.task.type"),
    ("SENDER_EMAIL", "relay.email.sender_address"),
];

/// Load the service configuration from the standard locations.
pub fn load_config() -> Result<ServiceConfig, ConfigError> {
    load_config_from(&[SYSTEM_CONFIG_FILE, LOCAL_CONFIG_FILE])
}

/// Load the service configuration with `base_files` in place of the standard
/// file locations.
pub fn load_config_from(base_files: &[&str]) -> Result<ServiceConfig, ConfigError> {
    let mut builder = Config::builder();

    for name in base_files {
        builder = builder.add_source(
            File::with_name(name)
                .required(false)
                .format(FileFormat::Yaml),
        );
    }

    if let Some(explicit_path) = env_value(CONFIG_FILE_ENV) {
        builder = builder.add_source(
            File::with_name(&explicit_path)
                .required(true)
                .format(FileFormat::Yaml),
        );
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));
    builder = apply_legacy_variables(builder)?;

    builder.build()?.try_deserialize()
}

fn apply_legacy_variables(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (variable, key) in LEGACY_VARIABLES {
        if let Some(value) = env_value(variable) {
            builder = builder.set_override(*key, value)?;
        }
    }

    if let Some(value) = env_value("PORT") {
        let port: u16 = value
            .parse()
            .map_err(|_| ConfigError::Message(format!("PORT '{value}' is not a valid port")))?;
        builder = builder.set_override("server.port", i64::from(port))?;
    }

    Ok(builder)
}

/// Blank values count as unset.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "config_loader_tests.rs"]
mod tests;
