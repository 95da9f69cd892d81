//! In-process software CA.
//!
//! Generates an ECDSA P-256 self-signed root with `rcgen` when the root is
//! resolved and signs leaf certificates with it. The key never leaves process
//! memory, so a restart produces a new root; the issuer cache keeps one root per
//! declaration for the lifetime of the process.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, Ia5String,
    IsCa, KeyPair, KeyUsagePurpose, SanType, SerialNumber,
};
use tracing::{debug, info};

use super::{CertificateIssuer, IssueRequest, IssuedCertificate, ProviderError};
use crate::domain::{ProviderKind, SecretString, SoftwareCaConfig};

/// Self-signed root CA held in memory.
pub struct SoftwareCa {
    issuer_id: String,
    key: KeyPair,
    cert: Certificate,
    cert_pem: String,
    common_name: String,
    organization: String,
}

impl std::fmt::Debug for SoftwareCa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareCa")
            .field("issuer_id", &self.issuer_id)
            .field("common_name", &self.common_name)
            .field("organization", &self.organization)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SoftwareCa {
    /// Generate a fresh root CA. Leaves it signs carry `issuer_id`.
    pub fn generate(issuer_id: impl Into<String>, config: &SoftwareCaConfig) -> Result<Self, ProviderError> {
        if config.common_name.is_empty() {
            return Err(ProviderError::config("software CA common name cannot be empty"));
        }
        if config.validity_days == 0 {
            return Err(ProviderError::config("software CA validity must be at least one day"));
        }

        let key = KeyPair::generate().map_err(|e| ProviderError::certificate(e.to_string()))?;

        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, config.common_name.as_str());
        params.distinguished_name.push(DnType::OrganizationName, config.organization.as_str());
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.serial_number = Some(random_serial().0);

        let not_before = Utc::now();
        let not_after = Duration::try_days(i64::from(config.validity_days))
            .and_then(|validity| not_before.checked_add_signed(validity))
            .ok_or_else(|| {
                ProviderError::certificate(format!(
                    "software CA validity of {} days is out of range",
                    config.validity_days
                ))
            })?;
        params.not_before = to_offset(not_before)?;
        params.not_after = to_offset(not_after)?;

        let cert = params.self_signed(&key).map_err(|e| ProviderError::certificate(e.to_string()))?;
        let cert_pem = cert.pem();

        info!(
            common_name = %config.common_name,
            not_after = %not_after,
            "Generated software root CA"
        );

        Ok(Self {
            issuer_id: issuer_id.into(),
            key,
            cert,
            cert_pem,
            common_name: config.common_name.clone(),
            organization: config.organization.clone(),
        })
    }

    pub fn root_certificate_pem(&self) -> &str {
        &self.cert_pem
    }
}

#[async_trait]
impl CertificateIssuer for SoftwareCa {
    async fn issue_certificate(&self, request: &IssueRequest) -> Result<IssuedCertificate, ProviderError> {
        let leaf_key = KeyPair::generate().map_err(|e| ProviderError::certificate(e.to_string()))?;

        let mut params = CertificateParams::new(vec![request.common_name.clone()])
            .map_err(|e| ProviderError::certificate(e.to_string()))?;
        params.distinguished_name.push(DnType::CommonName, request.common_name.as_str());
        params.distinguished_name.push(DnType::OrganizationName, self.organization.as_str());
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature, KeyUsagePurpose::KeyEncipherment];
        params.extended_key_usages =
            vec![ExtendedKeyUsagePurpose::ServerAuth, ExtendedKeyUsagePurpose::ClientAuth];

        for uri in &request.uri_sans {
            let uri = Ia5String::try_from(uri.clone())
                .map_err(|e| ProviderError::certificate(format!("invalid URI SAN '{}': {}", uri, e)))?;
            params.subject_alt_names.push(SanType::URI(uri));
        }

        let (serial, serial_hex) = random_serial();
        params.serial_number = Some(serial);

        let validity = Duration::from_std(request.validity)
            .map_err(|e| ProviderError::certificate(format!("invalid validity: {}", e)))?;
        let not_before = Utc::now();
        let expires_at = not_before.checked_add_signed(validity).ok_or_else(|| {
            ProviderError::certificate(format!("validity of {}s is out of range", request.validity.as_secs()))
        })?;
        params.not_before = to_offset(not_before)?;
        params.not_after = to_offset(expires_at)?;

        let cert = params
            .signed_by(&leaf_key, &self.cert, &self.key)
            .map_err(|e| ProviderError::certificate(e.to_string()))?;

        debug!(
            common_name = %request.common_name,
            serial_number = %serial_hex,
            expires_at = %expires_at,
            "Issued leaf certificate from software CA"
        );

        Ok(IssuedCertificate {
            common_name: request.common_name.clone(),
            certificate_pem: cert.pem(),
            private_key: SecretString::new(leaf_key.serialize_pem()),
            issuing_ca_pem: self.cert_pem.clone(),
            serial_number: serial_hex,
            expires_at,
            issuer_id: self.issuer_id.clone(),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Software
    }
}

/// Positive 128-bit serial number and its hex form.
fn random_serial() -> (SerialNumber, String) {
    let mut bytes = uuid::Uuid::new_v4().into_bytes();
    bytes[0] &= 0x7f;
    (SerialNumber::from_slice(&bytes), hex::encode(bytes))
}

fn to_offset(at: DateTime<Utc>) -> Result<time::OffsetDateTime, ProviderError> {
    time::OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| ProviderError::certificate(format!("timestamp out of range: {}", e)))
}
