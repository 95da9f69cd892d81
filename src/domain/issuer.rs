//! Resolved issuers.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::root::RootDeclaration;
use crate::providers::{CertificateIssuer, ProviderHandle};

/// A usable handle to one root's signing and validating capability.
///
/// Issuers are shared as `Arc<Issuer>`. Trust State is the only long-lived owner;
/// the issuer resolver only borrows installed issuers to reuse them.
pub struct Issuer {
    id: String,
    trust_domain: String,
    spiffe_enabled: bool,
    root_certificate: String,
    fingerprint: String,
    client: Arc<dyn CertificateIssuer>,
}

impl Issuer {
    /// Build an issuer for `root` from the handle its provider returned.
    pub fn new(root: &RootDeclaration, handle: ProviderHandle) -> Self {
        let fingerprint = hex::encode(Sha256::digest(handle.root_certificate.as_bytes()));
        Self {
            id: root.name.clone(),
            trust_domain: root.trust_domain.clone(),
            spiffe_enabled: root.spiffe_enabled,
            root_certificate: handle.root_certificate,
            fingerprint,
            client: handle.client,
        }
    }

    /// Name of the originating root declaration.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn trust_domain(&self) -> &str {
        &self.trust_domain
    }

    pub fn spiffe_enabled(&self) -> bool {
        self.spiffe_enabled
    }

    /// PEM-encoded root CA certificate.
    pub fn root_certificate(&self) -> &str {
        &self.root_certificate
    }

    /// SHA-256 over the PEM-encoded root, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn client(&self) -> &Arc<dyn CertificateIssuer> {
        &self.client
    }
}

impl fmt::Debug for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Issuer")
            .field("id", &self.id)
            .field("trust_domain", &self.trust_domain)
            .field("spiffe_enabled", &self.spiffe_enabled)
            .field("fingerprint", &self.fingerprint)
            .field("provider", &self.client.kind())
            .finish()
    }
}
