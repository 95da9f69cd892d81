//! Provider collaborators that turn a root declaration into a certificate issuer.
//!
//! # Architecture
//!
//! The reconciler only depends on the [`ProviderResolver`] capability
//! ("declaration in, issuer handle out"). Concrete providers are variants
//! selected by the declaration's [`ProviderConfig`]:
//!
//! - **Software**: in-process CA generated with `rcgen`
//! - **Vault PKI**: HashiCorp Vault PKI secrets engine (`vault` feature)
//!
//! Every provider hands back a [`ProviderHandle`]: a [`CertificateIssuer`] client
//! plus the PEM of the root certificate it signs under.

pub mod software;
#[cfg(feature = "vault")]
pub mod vault;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::domain::{ProviderConfig, ProviderKind, RootDeclaration, SecretString};

pub use software::SoftwareCa;
#[cfg(feature = "vault")]
pub use vault::VaultPkiIssuer;

/// Errors raised by provider collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider configuration is unusable.
    #[error("Provider configuration error: {message}")]
    Config { message: String },

    /// The provider backend could not be reached.
    #[error("Provider connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The provider backend rejected or failed the operation.
    #[error("Provider backend error: {message}")]
    Backend { message: String },

    /// Certificate generation or encoding failed.
    #[error("Certificate error: {message}")]
    Certificate { message: String },

    /// The provider kind is not compiled into this build.
    #[error("Provider '{kind}' is not supported by this build")]
    Unsupported { kind: ProviderKind },
}

impl ProviderError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into() }
    }

    pub fn certificate(message: impl Into<String>) -> Self {
        Self::Certificate { message: message.into() }
    }
}

/// Request for a leaf certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    pub common_name: String,
    /// URI subject alternative names, e.g. a SPIFFE ID
    pub uri_sans: Vec<String>,
    pub validity: Duration,
}

/// Leaf certificate minted by an issuer.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub common_name: String,
    pub certificate_pem: String,
    pub private_key: SecretString,
    /// PEM of the CA that signed the certificate
    pub issuing_ca_pem: String,
    pub serial_number: String,
    pub expires_at: DateTime<Utc>,
    /// Root name of the issuer that signed the certificate
    pub issuer_id: String,
}

/// Signing client obtained from a provider.
#[async_trait]
pub trait CertificateIssuer: Send + Sync + fmt::Debug {
    /// Mint a leaf certificate signed by this root.
    async fn issue_certificate(&self, request: &IssueRequest) -> Result<IssuedCertificate, ProviderError>;

    fn kind(&self) -> ProviderKind;
}

/// What a provider returns for one root declaration.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    pub client: Arc<dyn CertificateIssuer>,
    /// PEM-encoded root CA certificate
    pub root_certificate: String,
}

/// The "declaration in, issuer handle out" capability the reconciler depends on.
#[async_trait]
pub trait ProviderResolver: Send + Sync {
    async fn resolve(&self, root: &RootDeclaration) -> Result<ProviderHandle, ProviderError>;
}

/// Dispatches on [`ProviderConfig`] to the provider compiled into this build.
#[derive(Debug, Default, Clone)]
pub struct DefaultProviderResolver;

impl DefaultProviderResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderResolver for DefaultProviderResolver {
    async fn resolve(&self, root: &RootDeclaration) -> Result<ProviderHandle, ProviderError> {
        debug!(root = %root.name, provider = %root.provider.kind(), "Resolving provider for root");
        match &root.provider {
            ProviderConfig::Software(config) => {
                let ca = SoftwareCa::generate(&root.name, config)?;
                let root_certificate = ca.root_certificate_pem().to_string();
                Ok(ProviderHandle { client: Arc::new(ca), root_certificate })
            }
            #[cfg(feature = "vault")]
            ProviderConfig::Vault(config) => {
                let (issuer, root_certificate) = VaultPkiIssuer::connect(&root.name, config).await?;
                Ok(ProviderHandle { client: Arc::new(issuer), root_certificate })
            }
            #[cfg(not(feature = "vault"))]
            ProviderConfig::Vault(_) => Err(ProviderError::Unsupported { kind: ProviderKind::VaultPki }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RootIntent, SoftwareCaConfig};

    #[tokio::test]
    async fn test_default_resolver_builds_software_ca() {
        let root = RootDeclaration::new(
            "mesh-root",
            "cluster.local",
            RootIntent::Active,
            ProviderConfig::Software(SoftwareCaConfig::new("mesh-root-ca")),
        );

        let handle = DefaultProviderResolver::new().resolve(&root).await.unwrap();
        assert_eq!(handle.client.kind(), ProviderKind::Software);
        assert!(handle.root_certificate.contains("BEGIN CERTIFICATE"));
    }

    #[test]
    fn test_error_constructors() {
        let err = ProviderError::connection_failed("timeout");
        assert!(matches!(err, ProviderError::ConnectionFailed { .. }));
        assert_eq!(err.to_string(), "Provider connection failed: timeout");

        let err = ProviderError::Unsupported { kind: ProviderKind::VaultPki };
        assert!(err.to_string().contains("vault_pki"));
    }
}
