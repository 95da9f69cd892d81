//! Common test utilities for all integration tests.
//!
//! Provides root declaration builders and an instrumented provider resolver
//! that counts how often each root is resolved.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use meshroot::domain::{ProviderConfig, ProviderKind, RootDeclaration, RootIntent, SecretString, SoftwareCaConfig};
use meshroot::providers::{
    CertificateIssuer, IssueRequest, IssuedCertificate, ProviderError, ProviderHandle, ProviderResolver,
};
use meshroot::store::InMemoryRootStore;
use meshroot::trust::{Reconciler, TrustState};

pub fn root(name: &str, intent: RootIntent) -> RootDeclaration {
    RootDeclaration::new(
        name,
        "cluster.local",
        intent,
        ProviderConfig::Software(SoftwareCaConfig::new(format!("{}-ca", name))),
    )
}

/// Issuer that signs nothing and reports a fixed root PEM.
#[derive(Debug)]
pub struct StaticIssuer {
    pub root_name: String,
}

#[async_trait]
impl CertificateIssuer for StaticIssuer {
    async fn issue_certificate(&self, request: &IssueRequest) -> Result<IssuedCertificate, ProviderError> {
        Ok(IssuedCertificate {
            common_name: request.common_name.clone(),
            certificate_pem: format!("leaf signed by {}\n", self.root_name),
            private_key: SecretString::new("key"),
            issuing_ca_pem: static_root_pem(&self.root_name),
            serial_number: "01".to_string(),
            expires_at: Utc::now() + chrono::Duration::from_std(request.validity).unwrap(),
            issuer_id: self.root_name.clone(),
        })
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Software
    }
}

pub fn static_root_pem(root_name: &str) -> String {
    format!("-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n", root_name)
}

/// Provider resolver that records every call and can be told to fail.
#[derive(Default)]
pub struct CountingProvider {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl CountingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every resolution of `root_name` fail.
    pub fn fail_for(&self, root_name: &str) {
        self.failing.lock().unwrap().insert(root_name.to_string());
    }

    pub fn recover(&self, root_name: &str) {
        self.failing.lock().unwrap().remove(root_name);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ProviderResolver for CountingProvider {
    async fn resolve(&self, root: &RootDeclaration) -> Result<ProviderHandle, ProviderError> {
        self.calls.lock().unwrap().push(root.name.clone());
        if self.failing.lock().unwrap().contains(&root.name) {
            return Err(ProviderError::connection_failed(format!("{} backend unreachable", root.name)));
        }
        Ok(ProviderHandle {
            client: Arc::new(StaticIssuer { root_name: root.name.clone() }),
            root_certificate: static_root_pem(&root.name),
        })
    }
}

pub struct Harness {
    pub store: Arc<InMemoryRootStore>,
    pub provider: Arc<CountingProvider>,
    pub state: Arc<TrustState>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub fn new(roots: Vec<RootDeclaration>) -> Self {
        let store = Arc::new(InMemoryRootStore::with_roots(roots));
        let provider = CountingProvider::new();
        let state = Arc::new(TrustState::new());
        let reconciler = Arc::new(Reconciler::new(store.clone(), provider.clone(), state.clone()));
        Self { store, provider, state, reconciler }
    }

    /// Installed (signing, validating) ids.
    pub fn installed(&self) -> Option<(String, String)> {
        self.state
            .snapshot()
            .map(|pair| (pair.signing().id().to_string(), pair.validating().id().to_string()))
    }
}

pub fn ids(signing: &str, validating: &str) -> Option<(String, String)> {
    Some((signing.to_string(), validating.to_string()))
}

/// Poll `condition` until it holds or five seconds pass.
pub async fn eventually<F>(mut condition: F, what: &str)
where
    F: FnMut() -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}
