//! Root certificate declarations and their lifecycle intent.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::provider::ProviderConfig;

/// Lifecycle intent of a root certificate.
///
/// Literals this build does not know about deserialize to [`RootIntent::Unknown`]
/// so a typo in one declaration is reported by the reconciler instead of making
/// the whole listing unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootIntent {
    /// Signs new leaf certificates and is trusted for validation.
    Active,
    /// Trusted for validation only.
    Passive,
    /// Retired. Ignored by every reconciliation step.
    Inactive,
    #[serde(other)]
    Unknown,
}

impl RootIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
            Self::Inactive => "inactive",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RootIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Externally managed description of one trust root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RootDeclaration {
    /// Unique root name, also used as the issuer identity
    #[validate(length(min = 1, max = 253, message = "Root name must be 1-253 characters"))]
    pub name: String,

    /// Trust domain scoping certificate subjects
    #[validate(length(min = 1, message = "Trust domain cannot be empty"))]
    pub trust_domain: String,

    /// Whether issued certificates carry a SPIFFE URI SAN
    #[serde(default)]
    pub spiffe_enabled: bool,

    pub intent: RootIntent,

    pub provider: ProviderConfig,
}

impl RootDeclaration {
    pub fn new(
        name: impl Into<String>,
        trust_domain: impl Into<String>,
        intent: RootIntent,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            name: name.into(),
            trust_domain: trust_domain.into(),
            spiffe_enabled: false,
            intent,
            provider,
        }
    }

    pub fn with_spiffe(mut self, enabled: bool) -> Self {
        self.spiffe_enabled = enabled;
        self
    }

    pub fn is_inactive(&self) -> bool {
        self.intent == RootIntent::Inactive
    }

    pub fn is_active(&self) -> bool {
        self.intent == RootIntent::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SoftwareCaConfig;

    #[test]
    fn test_intent_display() {
        for intent in [RootIntent::Active, RootIntent::Passive, RootIntent::Inactive] {
            assert_eq!(intent.to_string(), intent.as_str());
        }
        assert_eq!(RootIntent::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_unknown_intent_literal_deserializes() {
        let intent: RootIntent = serde_yaml::from_str("deactivating").unwrap();
        assert_eq!(intent, RootIntent::Unknown);

        let intent: RootIntent = serde_yaml::from_str("passive").unwrap();
        assert_eq!(intent, RootIntent::Passive);
    }

    #[test]
    fn test_declaration_from_yaml() {
        let yaml = r#"
name: osm-mesh-root-certificate
trust_domain: cluster.local
spiffe_enabled: true
intent: active
provider:
  type: software
  common_name: osm-ca.openservicemesh.io
"#;
        let root: RootDeclaration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(root.name, "osm-mesh-root-certificate");
        assert!(root.spiffe_enabled);
        assert!(root.is_active());
        assert!(matches!(root.provider, ProviderConfig::Software(_)));
        assert!(root.validate().is_ok());
    }

    #[test]
    fn test_declaration_validation() {
        let root = RootDeclaration::new(
            "",
            "cluster.local",
            RootIntent::Active,
            ProviderConfig::Software(SoftwareCaConfig::new("ca")),
        );
        assert!(root.validate().is_err());
    }
}
