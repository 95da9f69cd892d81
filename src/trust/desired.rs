//! Desired-state resolution.
//!
//! Pure selection of which declared root signs and which validates. The only
//! input is the listing returned by the root store; nothing here touches Trust
//! State or a provider.

use crate::domain::{RootDeclaration, RootIntent};
use crate::errors::TrustError;

/// Roots chosen for the signing and validating roles.
///
/// Both fields hold the same declaration when a single root is in use.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredRoots {
    pub signing: RootDeclaration,
    pub validating: RootDeclaration,
}

impl DesiredRoots {
    fn self_paired(root: RootDeclaration) -> Self {
        Self { signing: root.clone(), validating: root }
    }

    /// True when one root plays both roles.
    pub fn is_self_paired(&self) -> bool {
        self.signing.name == self.validating.name
    }

    /// True for two distinct roots that are both active. Their roles are
    /// interchangeable and may be reported in either order between listings.
    pub fn is_active_pair(&self) -> bool {
        !self.is_self_paired() && self.signing.is_active() && self.validating.is_active()
    }
}

/// Select the signing and validating roots from every declared root.
///
/// Inactive roots are dropped first. One remaining root must be active and
/// plays both roles. Two remaining roots must be active+passive (either order)
/// or active+active; in the latter case listing order decides the roles.
pub fn resolve_desired_roots(roots: Vec<RootDeclaration>) -> Result<DesiredRoots, TrustError> {
    let mut eligible: Vec<RootDeclaration> = roots.into_iter().filter(|root| !root.is_inactive()).collect();

    match eligible.len() {
        0 => Err(TrustError::NoRootsFound),
        1 => {
            let root = eligible.remove(0);
            if !root.is_active() {
                return Err(TrustError::ExpectedActiveRoot { name: root.name, intent: root.intent });
            }
            Ok(DesiredRoots::self_paired(root))
        }
        2 => {
            let second = eligible.remove(1);
            let first = eligible.remove(0);
            match (first.intent, second.intent) {
                (RootIntent::Active, RootIntent::Passive) | (RootIntent::Active, RootIntent::Active) => {
                    Ok(DesiredRoots { signing: first, validating: second })
                }
                (RootIntent::Passive, RootIntent::Active) => {
                    Ok(DesiredRoots { signing: second, validating: first })
                }
                (first, second) => Err(TrustError::InvalidIntentCombination { first, second }),
            }
        }
        count => Err(TrustError::TooManyRoots { count }),
    }
}
