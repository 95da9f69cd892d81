//! Vault PKI provider.
//!
//! Uses HashiCorp Vault's PKI secrets engine: the root lives in Vault, leaf
//! certificates are issued through a PKI role, and the root PEM is read from the
//! mount's CA endpoint when the root is resolved.

use async_trait::async_trait;
use chrono::DateTime;
use tracing::{error, info};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};

use super::{CertificateIssuer, IssueRequest, IssuedCertificate, ProviderError};
use crate::domain::{ProviderKind, SecretString, VaultPkiConfig};

/// Leaf issuer backed by a Vault PKI role.
pub struct VaultPkiIssuer {
    issuer_id: String,
    client: VaultClient,
    address: String,
    mount_path: String,
    role: String,
}

impl std::fmt::Debug for VaultPkiIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultPkiIssuer")
            .field("issuer_id", &self.issuer_id)
            .field("address", &self.address)
            .field("pki_mount", &self.mount_path)
            .field("pki_role", &self.role)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultPkiIssuer {
    /// Connect to Vault and read the root certificate of the PKI mount.
    ///
    /// Returns the issuer together with the PEM-encoded root. Leaves it signs
    /// carry `issuer_id`.
    pub async fn connect(
        issuer_id: impl Into<String>,
        config: &VaultPkiConfig,
    ) -> Result<(Self, String), ProviderError> {
        if config.token.is_empty() {
            return Err(ProviderError::config("Vault token cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);
        settings_builder.token(config.token.expose_secret());
        if let Some(namespace) = &config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder
            .build()
            .map_err(|e| ProviderError::config(format!("Invalid Vault configuration: {}", e)))?;

        let client = VaultClient::new(settings).map_err(|e| {
            ProviderError::connection_failed(format!("Failed to create Vault client: {}", e))
        })?;

        let root = vaultrs::pki::cert::read(&client, &config.mount_path, "ca").await.map_err(|e| {
            error!(
                error = %e,
                vault_addr = %config.address,
                pki_mount = %config.mount_path,
                "Failed to read root certificate from Vault PKI"
            );
            ProviderError::connection_failed(format!("Failed to read Vault PKI root: {}", e))
        })?;

        info!(
            vault_addr = %config.address,
            pki_mount = %config.mount_path,
            pki_role = %config.role,
            "Vault PKI issuer initialized"
        );

        let issuer = Self {
            issuer_id: issuer_id.into(),
            client,
            address: config.address.clone(),
            mount_path: config.mount_path.clone(),
            role: config.role.clone(),
        };
        Ok((issuer, root.certificate))
    }
}

#[async_trait]
impl CertificateIssuer for VaultPkiIssuer {
    async fn issue_certificate(&self, request: &IssueRequest) -> Result<IssuedCertificate, ProviderError> {
        use vaultrs::pki::cert;

        let mut opts = vaultrs::api::pki::requests::GenerateCertificateRequestBuilder::default();
        opts.common_name(request.common_name.clone());
        if !request.uri_sans.is_empty() {
            opts.uri_sans(request.uri_sans.join(","));
        }
        opts.ttl(format!("{}s", request.validity.as_secs()));

        let response = cert::generate(&self.client, &self.mount_path, &self.role, Some(&mut opts))
            .await
            .map_err(|e| ProviderError::backend(format!("Vault PKI issue failed: {}", e)))?;

        let expires_at = match response.expiration {
            Some(ts) => DateTime::from_timestamp(ts as i64, 0).ok_or_else(|| {
                ProviderError::backend(format!("Invalid expiration timestamp from Vault PKI: {}", ts))
            })?,
            None => {
                return Err(ProviderError::backend("Vault PKI response missing expiration timestamp"));
            }
        };

        Ok(IssuedCertificate {
            common_name: request.common_name.clone(),
            certificate_pem: response.certificate,
            private_key: SecretString::new(response.private_key),
            issuing_ca_pem: response.issuing_ca,
            serial_number: response.serial_number,
            expires_at,
            issuer_id: self.issuer_id.clone(),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::VaultPki
    }
}
