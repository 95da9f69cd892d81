//! Issuer resolution with reuse of installed issuers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::desired::DesiredRoots;
use super::state::IssuerPair;
use crate::domain::{Issuer, RootDeclaration};
use crate::errors::TrustError;
use crate::observability::MetricsRecorder;
use crate::providers::ProviderResolver;

/// Materializes desired roots into issuers.
///
/// An installed issuer whose id matches a desired root name is reused as is, so
/// provider clients are only built for roots that are not installed yet.
pub struct IssuerResolver {
    provider: Arc<dyn ProviderResolver>,
    metrics: MetricsRecorder,
}

impl IssuerResolver {
    pub fn new(provider: Arc<dyn ProviderResolver>) -> Self {
        Self { provider, metrics: MetricsRecorder::new() }
    }

    /// Resolve both roles. Any provider failure aborts the whole resolution.
    pub async fn resolve_pair(
        &self,
        desired: &DesiredRoots,
        installed: Option<&IssuerPair>,
    ) -> Result<IssuerPair, TrustError> {
        let signing = self.resolve_one(&desired.signing, installed).await?;

        let validating = if desired.is_self_paired() {
            signing.clone()
        } else {
            self.resolve_one(&desired.validating, installed).await?
        };

        Ok(IssuerPair::new(signing, validating))
    }

    async fn resolve_one(
        &self,
        root: &RootDeclaration,
        installed: Option<&IssuerPair>,
    ) -> Result<Arc<Issuer>, TrustError> {
        if let Some(existing) = installed.and_then(|pair| pair.find(&root.name)) {
            debug!(root = %root.name, "Reusing installed issuer");
            return Ok(existing.clone());
        }

        let provider = root.provider.kind();
        match self.provider.resolve(root).await {
            Ok(handle) => {
                self.metrics.record_provider_resolution(provider.as_str(), true);
                let issuer = Issuer::new(root, handle);
                info!(
                    root = %root.name,
                    provider = %provider,
                    fingerprint = %issuer.fingerprint(),
                    "Resolved issuer for root"
                );
                Ok(Arc::new(issuer))
            }
            Err(e) => {
                self.metrics.record_provider_resolution(provider.as_str(), false);
                warn!(root = %root.name, provider = %provider, error = %e, "Provider resolution failed");
                Err(TrustError::provider(&root.name, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderConfig, RootIntent, SoftwareCaConfig};
    use crate::providers::{ProviderError, ProviderHandle};
    use crate::trust::state::tests::issuer;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Hands out pre-built issuers' handles and remembers which roots were asked for.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<String>>,
        fail: Option<String>,
    }

    impl RecordingProvider {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderResolver for RecordingProvider {
        async fn resolve(&self, root: &RootDeclaration) -> Result<ProviderHandle, ProviderError> {
            self.calls.lock().unwrap().push(root.name.clone());
            if self.fail.as_deref() == Some(root.name.as_str()) {
                return Err(ProviderError::backend("backend unavailable"));
            }
            let template = issuer(&root.name);
            Ok(ProviderHandle {
                client: template.client().clone(),
                root_certificate: template.root_certificate().to_string(),
            })
        }
    }

    fn root(name: &str, intent: RootIntent) -> RootDeclaration {
        RootDeclaration::new(
            name,
            "cluster.local",
            intent,
            ProviderConfig::Software(SoftwareCaConfig::new(name)),
        )
    }

    fn desired(signing: &str, validating: &str) -> DesiredRoots {
        DesiredRoots { signing: root(signing, RootIntent::Active), validating: root(validating, RootIntent::Passive) }
    }

    #[tokio::test]
    async fn test_self_paired_root_resolved_once() {
        let provider = Arc::new(RecordingProvider::default());
        let resolver = IssuerResolver::new(provider.clone());

        let pair = resolver.resolve_pair(&desired("A", "A"), None).await.unwrap();
        assert_eq!(provider.calls(), vec!["A"]);
        assert!(Arc::ptr_eq(pair.signing(), pair.validating()));
    }

    #[tokio::test]
    async fn test_installed_issuers_are_reused() {
        let provider = Arc::new(RecordingProvider::default());
        let resolver = IssuerResolver::new(provider.clone());
        let installed = IssuerPair::new(issuer("A"), issuer("B"));

        // Roles swapped relative to the installed pair: no provider call either way.
        let pair = resolver.resolve_pair(&desired("B", "A"), Some(&installed)).await.unwrap();
        assert!(provider.calls().is_empty());
        assert!(Arc::ptr_eq(pair.signing(), installed.validating()));
        assert!(Arc::ptr_eq(pair.validating(), installed.signing()));
    }

    #[tokio::test]
    async fn test_only_new_roots_hit_the_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let resolver = IssuerResolver::new(provider.clone());
        let single = issuer("A");
        let installed = IssuerPair::new(single.clone(), single.clone());

        let pair = resolver.resolve_pair(&desired("A", "B"), Some(&installed)).await.unwrap();
        assert_eq!(provider.calls(), vec!["B"]);
        assert!(Arc::ptr_eq(pair.signing(), &single));
        assert_eq!(pair.validating().id(), "B");
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_resolution() {
        let provider = Arc::new(RecordingProvider { fail: Some("B".to_string()), ..Default::default() });
        let resolver = IssuerResolver::new(provider.clone());

        let err = resolver.resolve_pair(&desired("A", "B"), None).await.unwrap_err();
        assert!(matches!(err, TrustError::ProviderResolutionFailed { ref root, .. } if root == "B"));
        assert_eq!(provider.calls(), vec!["A", "B"]);
    }
}
