//! # Metrics Collection
//!
//! Prometheus metrics for reconciliation and issuance. Recording is a no-op
//! until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;

use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Metrics recorder that tracks controller metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Register metric descriptions with the installed exporter
    pub fn register_metrics(&self) {
        describe_counter!(
            "meshroot_reconcile_total",
            Unit::Count,
            "Reconciliation passes grouped by outcome"
        );
        describe_counter!(
            "meshroot_trust_state_commits_total",
            Unit::Count,
            "Number of issuer pairs committed to trust state"
        );
        describe_counter!(
            "meshroot_provider_resolutions_total",
            Unit::Count,
            "Provider resolutions grouped by result"
        );
        describe_counter!(
            "meshroot_certificates_issued_total",
            Unit::Count,
            "Leaf certificates issued grouped by issuer"
        );
        describe_gauge!(
            "meshroot_trust_roots",
            Unit::Count,
            "Number of distinct roots currently trusted"
        );
    }

    /// Record a reconciliation pass outcome
    pub fn record_reconcile(&self, outcome: &str) {
        let labels = [("outcome", outcome.to_string())];
        counter!("meshroot_reconcile_total", &labels).increment(1);
    }

    /// Record a trust state commit
    pub fn record_commit(&self, trust_roots: usize) {
        counter!("meshroot_trust_state_commits_total").increment(1);
        gauge!("meshroot_trust_roots").set(trust_roots as f64);
    }

    /// Record a provider resolution attempt
    pub fn record_provider_resolution(&self, provider: &str, success: bool) {
        let result = if success { "success" } else { "error" };
        let labels = [("provider", provider.to_string()), ("result", result.to_string())];
        counter!("meshroot_provider_resolutions_total", &labels).increment(1);
    }

    /// Record an issued leaf certificate
    pub fn record_certificate_issued(&self, issuer: &str) {
        let labels = [("issuer", issuer.to_string())];
        counter!("meshroot_certificates_issued_total", &labels).increment(1);
    }
}

/// Install the Prometheus exporter
pub fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    MetricsRecorder::new().register_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}
