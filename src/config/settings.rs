//! Configuration settings for the meshroot controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Reconciler configuration
    #[validate(nested)]
    pub reconciler: ReconcilerConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;

        if self.observability.enable_metrics && self.observability.metrics_port == 0 {
            return Err(Error::validation("Metrics are enabled but the metrics port is 0"));
        }

        Ok(())
    }
}

/// Root reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReconcilerConfig {
    /// YAML file holding the root declarations
    #[validate(length(min = 1, message = "Roots file path cannot be empty"))]
    pub roots_file: String,

    /// Periodic re-sync interval in seconds (0 = disabled)
    #[validate(range(max = 86400, message = "Resync interval must be at most 24 hours"))]
    pub resync_interval_seconds: u64,

    /// How often the roots file is polled for changes
    #[validate(range(
        min = 1,
        max = 3600,
        message = "Watch interval must be between 1 second and 1 hour"
    ))]
    pub watch_interval_seconds: u64,

    /// Validity of issued leaf certificates when the caller does not ask for one
    #[validate(range(
        min = 1,
        max = 8760,
        message = "Certificate validity must be between 1 hour and 1 year"
    ))]
    pub default_certificate_validity_hours: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            roots_file: "roots.yaml".to_string(),
            resync_interval_seconds: 60,
            watch_interval_seconds: 5,
            default_certificate_validity_hours: 24,
        }
    }
}

impl ReconcilerConfig {
    /// Periodic re-sync interval (None if disabled)
    pub fn resync_interval(&self) -> Option<Duration> {
        match self.resync_interval_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_seconds)
    }

    pub fn default_certificate_validity(&self) -> Duration {
        Duration::from_secs(self.default_certificate_validity_hours * 3600)
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics exporter
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to every metric
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            service_name: "meshroot".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reconciler.resync_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.reconciler.default_certificate_validity(), Duration::from_secs(86400));
    }

    #[test]
    fn test_zero_resync_disables_resync() {
        let config = ReconcilerConfig { resync_interval_seconds: 0, ..Default::default() };
        assert_eq!(config.resync_interval(), None);
    }

    #[test]
    fn test_invalid_watch_interval() {
        let mut config = AppConfig::default();
        config.reconciler.watch_interval_seconds = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Watch interval"));
    }

    #[test]
    fn test_metrics_enabled_without_port() {
        let mut config = AppConfig::default();
        config.observability.enable_metrics = true;
        config.observability.metrics_port = 0;
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_metrics_bind_address() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_bind_address(), Some("0.0.0.0:9090".to_string()));

        let disabled = ObservabilityConfig { metrics_port: 0, ..Default::default() };
        assert_eq!(disabled.metrics_bind_address(), None);
    }
}
