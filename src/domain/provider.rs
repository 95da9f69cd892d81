//! Provider configuration carried by a root declaration.
//!
//! The variant selects which provider builds the issuer; the payload is opaque
//! to everything except that provider.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::secret::SecretString;

/// Kind of provider backing a root certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// In-process software CA
    Software,
    /// HashiCorp Vault PKI secrets engine
    VaultPki,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::VaultPki => "vault_pki",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provider-specific configuration, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    Software(SoftwareCaConfig),
    Vault(VaultPkiConfig),
}

impl ProviderConfig {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::Software(_) => ProviderKind::Software,
            Self::Vault(_) => ProviderKind::VaultPki,
        }
    }
}

/// Self-signed CA generated in process memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareCaConfig {
    /// Common name of the root CA certificate
    pub common_name: String,

    #[serde(default = "default_organization")]
    pub organization: String,

    /// Root CA validity in days
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

fn default_organization() -> String {
    "meshroot".to_string()
}

fn default_validity_days() -> u32 {
    3650
}

impl SoftwareCaConfig {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            organization: default_organization(),
            validity_days: default_validity_days(),
        }
    }
}

/// Vault PKI secrets engine holding the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultPkiConfig {
    /// Vault server address, e.g. `https://vault.mesh-system.svc:8200`
    pub address: String,

    /// PKI engine mount path
    #[serde(default = "default_mount_path")]
    pub mount_path: String,

    /// PKI role used to issue leaf certificates
    pub role: String,

    /// Vault token
    pub token: SecretString,

    /// Vault Enterprise namespace
    #[serde(default)]
    pub namespace: Option<String>,
}

fn default_mount_path() -> String {
    "pki".to_string()
}
