//! Idempotence guard.

use std::fmt;

use super::desired::DesiredRoots;
use super::state::IssuerPair;

/// Whether a desired pair needs to be resolved and committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Nothing is installed yet.
    Bootstrap,
    /// Installed issuers already match the desired roles.
    ExactMatch,
    /// Two active roots reported in the opposite order from the installed pair.
    SwappedActivePair,
    /// The desired pair differs from what is installed.
    Changed,
}

impl GuardDecision {
    pub fn requires_update(&self) -> bool {
        matches!(self, Self::Bootstrap | Self::Changed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bootstrap => "bootstrap",
            Self::ExactMatch => "exact_match",
            Self::SwappedActivePair => "swapped_active_pair",
            Self::Changed => "changed",
        }
    }
}

impl fmt::Display for GuardDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compare the desired roots against the installed pair.
pub fn evaluate(desired: &DesiredRoots, installed: Option<&IssuerPair>) -> GuardDecision {
    let Some(installed) = installed else {
        return GuardDecision::Bootstrap;
    };

    let installed_signing = installed.signing().id();
    let installed_validating = installed.validating().id();
    let desired_signing = desired.signing.name.as_str();
    let desired_validating = desired.validating.name.as_str();

    if installed_signing == desired_signing && installed_validating == desired_validating {
        return GuardDecision::ExactMatch;
    }

    // Set equality over two distinct names reduces to the crossed comparison.
    if desired.is_active_pair()
        && installed_signing == desired_validating
        && installed_validating == desired_signing
    {
        return GuardDecision::SwappedActivePair;
    }

    GuardDecision::Changed
}
