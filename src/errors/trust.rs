//! Reconciliation error taxonomy.
//!
//! Every variant returned from a reconciliation pass means Trust State was left
//! exactly as it was before the pass started.

use thiserror::Error;

use crate::domain::RootIntent;
use crate::providers::ProviderError;
use crate::store::StoreError;

/// Errors raised while selecting, resolving, or using trust roots.
#[derive(Debug, Error)]
pub enum TrustError {
    /// Listing returned zero roots once inactive ones were dropped.
    #[error("no active or passive root certificates found")]
    NoRootsFound,

    /// More than two roots hold a non-inactive intent at the same time.
    #[error("found {count} roots with active or passive intent, at most 2 are supported")]
    TooManyRoots { count: usize },

    /// The only remaining root is not active.
    #[error("expected single root '{name}' to have active intent, found {intent}")]
    ExpectedActiveRoot { name: String, intent: RootIntent },

    /// Two roots whose intents are not a sanctioned pairing.
    #[error("invalid combination of {first} intent and {second} intent")]
    InvalidIntentCombination { first: RootIntent, second: RootIntent },

    /// The provider collaborator could not build an issuer for a root.
    #[error("failed to resolve issuer for root '{root}': {source}")]
    ProviderResolutionFailed {
        root: String,
        #[source]
        source: ProviderError,
    },

    /// The root store could not be listed.
    #[error("failed to list root certificates: {source}")]
    ListRootsFailed {
        #[source]
        source: StoreError,
    },

    /// A certificate was requested before any reconciliation succeeded.
    #[error("no signing issuer is installed")]
    NoSigningIssuer,

    /// The signing issuer's provider failed to mint a certificate.
    #[error("issuer '{root}' failed to issue certificate: {source}")]
    Issuance {
        root: String,
        #[source]
        source: ProviderError,
    },
}

impl TrustError {
    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoRootsFound => "no_roots_found",
            Self::TooManyRoots { .. } => "too_many_roots",
            Self::ExpectedActiveRoot { .. } => "expected_active_root",
            Self::InvalidIntentCombination { .. } => "invalid_intent_combination",
            Self::ProviderResolutionFailed { .. } => "provider_resolution_failed",
            Self::ListRootsFailed { .. } => "list_roots_failed",
            Self::NoSigningIssuer => "no_signing_issuer",
            Self::Issuance { .. } => "issuance_failed",
        }
    }

    pub(crate) fn provider(root: impl Into<String>, source: ProviderError) -> Self {
        Self::ProviderResolutionFailed { root: root.into(), source }
    }
}
