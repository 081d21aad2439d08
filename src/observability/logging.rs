//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! Configuration faults (a broken mapping document, an unreadable mapping
//! file) are logged at `error` level with a `severity = "critical"` field so
//! operators can alert on them separately from client mistakes, which are
//! logged at `warn`.

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span for a single classification.
///
/// ```rust,ignore
/// let span = classify_span!("GET", "/v2/abc/volumes");
/// let span = classify_span!("POST", "/v2/abc/volumes/1/action", operation = "reboot");
/// ```
#[macro_export]
macro_rules! classify_span {
    ($method:expr, $path:expr) => {
        tracing::info_span!(
            "classify_request",
            method = %$method,
            path = %$path,
            correlation_id = %uuid::Uuid::new_v4(),
            canonical_url = tracing::field::Empty
        )
    };
    ($method:expr, $path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "classify_request",
            method = %$method,
            path = %$path,
            correlation_id = %uuid::Uuid::new_v4(),
            canonical_url = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Returns an error if a
/// subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            let message = format!("Invalid log level '{}'", config.log_level);
            Error::config_with_source(message, Box::new(e))
        })?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        service_name = %config.observability.service_name,
        server_address = %config.server.bind_address(),
        mapping_file = %config.classifier.mapping_file,
        routes_file = %config.classifier.routes_file,
        script_name = %config.classifier.script_name,
        action_sentinel = %config.classifier.action_sentinel,
        "Route classifier configuration"
    );
}
