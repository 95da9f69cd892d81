//! Trust State: the installed (signing, validating) issuer pair.
//!
//! The pair is an immutable value behind an `Arc` and is replaced wholesale on
//! commit, so readers either see the previous pair or the new one.

use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::Issuer;

/// Signing and validating issuers, installed together.
#[derive(Debug, Clone)]
pub struct IssuerPair {
    signing: Arc<Issuer>,
    validating: Arc<Issuer>,
}

impl IssuerPair {
    pub fn new(signing: Arc<Issuer>, validating: Arc<Issuer>) -> Self {
        Self { signing, validating }
    }

    pub fn signing(&self) -> &Arc<Issuer> {
        &self.signing
    }

    pub fn validating(&self) -> &Arc<Issuer> {
        &self.validating
    }

    /// True when one issuer plays both roles.
    pub fn is_self_paired(&self) -> bool {
        Arc::ptr_eq(&self.signing, &self.validating) || self.signing.id() == self.validating.id()
    }

    /// Installed issuer with the given root name, if any.
    pub fn find(&self, id: &str) -> Option<&Arc<Issuer>> {
        [&self.signing, &self.validating].into_iter().find(|issuer| issuer.id() == id)
    }
}

/// The single authoritative issuer pair.
///
/// Empty until the first successful reconciliation, never empty afterwards.
#[derive(Debug, Default)]
pub struct TrustState {
    current: RwLock<Option<Arc<IssuerPair>>>,
}

impl TrustState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent view of both roles.
    pub fn snapshot(&self) -> Option<Arc<IssuerPair>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn signing_issuer(&self) -> Option<Arc<Issuer>> {
        self.snapshot().map(|pair| pair.signing.clone())
    }

    pub fn validating_issuer(&self) -> Option<Arc<Issuer>> {
        self.snapshot().map(|pair| pair.validating.clone())
    }

    /// Issuers whose roots are currently trusted, signing first, without duplicates.
    pub fn trust_roots(&self) -> Vec<Arc<Issuer>> {
        match self.snapshot() {
            Some(pair) if pair.is_self_paired() => vec![pair.signing.clone()],
            Some(pair) => vec![pair.signing.clone(), pair.validating.clone()],
            None => Vec::new(),
        }
    }

    /// Install a new pair. Both roles change in one step.
    pub(crate) fn commit(&self, pair: IssuerPair) -> Arc<IssuerPair> {
        let pair = Arc::new(pair);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(pair.clone());
        pair
    }
}
