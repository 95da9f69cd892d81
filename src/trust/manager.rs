//! Certificate issuance on top of Trust State.
//!
//! Leaf certificates are always minted by the current signing issuer. The trust
//! bundle handed to workloads contains every currently trusted root, so peers
//! holding certificates from either root of a rotation keep validating.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::state::TrustState;
use crate::errors::TrustError;
use crate::observability::MetricsRecorder;
use crate::providers::{IssueRequest, IssuedCertificate};

/// Issues leaf certificates and builds trust bundles from the installed pair.
#[derive(Debug, Clone)]
pub struct CertificateManager {
    state: Arc<TrustState>,
    default_validity: Duration,
    metrics: MetricsRecorder,
}

impl CertificateManager {
    pub fn new(state: Arc<TrustState>, default_validity: Duration) -> Self {
        Self { state, default_validity, metrics: MetricsRecorder::new() }
    }

    /// Issue a certificate for `identity` from the current signing issuer.
    ///
    /// The common name is `<identity>.<trust domain>`. Issuers with SPIFFE
    /// enabled also add `spiffe://<trust domain>/<identity>` as a URI SAN.
    pub async fn issue_certificate(
        &self,
        identity: &str,
        validity: Option<Duration>,
    ) -> Result<IssuedCertificate, TrustError> {
        // Hold on to this issuer for the whole call even if a commit lands meanwhile.
        let issuer = self.state.signing_issuer().ok_or(TrustError::NoSigningIssuer)?;

        let mut uri_sans = Vec::new();
        if issuer.spiffe_enabled() {
            uri_sans.push(format!("spiffe://{}/{}", issuer.trust_domain(), identity));
        }
        let request = IssueRequest {
            common_name: format!("{}.{}", identity, issuer.trust_domain()),
            uri_sans,
            validity: validity.unwrap_or(self.default_validity),
        };

        let certificate = issuer
            .client()
            .issue_certificate(&request)
            .await
            .map_err(|source| TrustError::Issuance { root: issuer.id().to_string(), source })?;

        self.metrics.record_certificate_issued(issuer.id());
        debug!(
            issuer = %issuer.id(),
            common_name = %certificate.common_name,
            serial_number = %certificate.serial_number,
            "Issued certificate"
        );

        Ok(certificate)
    }

    /// PEM bundle of every trusted root, signing root first. `None` before the
    /// first successful reconciliation.
    pub fn trust_bundle(&self) -> Option<String> {
        let roots = self.state.trust_roots();
        if roots.is_empty() {
            return None;
        }

        let mut bundle = String::new();
        for issuer in roots {
            let pem = issuer.root_certificate();
            if bundle.contains(pem) {
                continue;
            }
            bundle.push_str(pem);
            if !pem.ends_with('\n') {
                bundle.push('\n');
            }
        }
        Some(bundle)
    }
}
