//! # Configuration Management
//!
//! Settings are read from `MESHROOT_*` environment variables (a `.env` file is
//! loaded by the binary first) and validated before anything starts.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MESHROOT_ROOTS_FILE` | `roots.yaml` |
//! | `MESHROOT_RESYNC_INTERVAL_SECONDS` | `60` (0 disables) |
//! | `MESHROOT_WATCH_INTERVAL_SECONDS` | `5` |
//! | `MESHROOT_CERT_VALIDITY_HOURS` | `24` |
//! | `MESHROOT_SERVICE_NAME` | `meshroot` |
//! | `MESHROOT_LOG_LEVEL` | `info` |
//! | `MESHROOT_JSON_LOGGING` | `false` |
//! | `MESHROOT_ENABLE_METRICS` | `false` |
//! | `MESHROOT_METRICS_PORT` | `9090` |

pub mod settings;

pub use settings::{AppConfig, ObservabilityConfig, ReconcilerConfig};

use std::str::FromStr;

use crate::errors::{Error, Result};

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let reconciler_defaults = ReconcilerConfig::default();
        let observability_defaults = ObservabilityConfig::default();

        let reconciler = ReconcilerConfig {
            roots_file: lookup("MESHROOT_ROOTS_FILE").unwrap_or(reconciler_defaults.roots_file),
            resync_interval_seconds: parse_var(
                &lookup,
                "MESHROOT_RESYNC_INTERVAL_SECONDS",
                reconciler_defaults.resync_interval_seconds,
            )?,
            watch_interval_seconds: parse_var(
                &lookup,
                "MESHROOT_WATCH_INTERVAL_SECONDS",
                reconciler_defaults.watch_interval_seconds,
            )?,
            default_certificate_validity_hours: parse_var(
                &lookup,
                "MESHROOT_CERT_VALIDITY_HOURS",
                reconciler_defaults.default_certificate_validity_hours,
            )?,
        };

        let observability = ObservabilityConfig {
            enable_metrics: parse_var(&lookup, "MESHROOT_ENABLE_METRICS", observability_defaults.enable_metrics)?,
            metrics_port: parse_var(&lookup, "MESHROOT_METRICS_PORT", observability_defaults.metrics_port)?,
            service_name: lookup("MESHROOT_SERVICE_NAME").unwrap_or(observability_defaults.service_name),
            log_level: lookup("MESHROOT_LOG_LEVEL").unwrap_or(observability_defaults.log_level),
            json_logging: parse_var(&lookup, "MESHROOT_JSON_LOGGING", observability_defaults.json_logging)?,
        };

        let config = Self { reconciler, observability };
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}
