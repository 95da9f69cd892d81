//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem. `RUST_LOG`
//! takes precedence over the configured log level when it is set.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for one reconciliation pass
#[macro_export]
macro_rules! reconcile_span {
    ($trigger:expr) => {
        tracing::info_span!(
            "reconcile",
            trigger = %$trigger,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($trigger:expr, $($field:tt)*) => {
        tracing::info_span!(
            "reconcile",
            trigger = %$trigger,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| Error::internal(format!("Failed to initialize logging: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        roots_file = %config.reconciler.roots_file,
        resync_interval_seconds = config.reconciler.resync_interval_seconds,
        watch_interval_seconds = config.reconciler.watch_interval_seconds,
        default_certificate_validity_hours = config.reconciler.default_certificate_validity_hours,
        metrics_enabled = config.observability.enable_metrics,
        "meshroot configuration"
    );
}
