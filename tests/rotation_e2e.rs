//! End-to-end rotation driven by a YAML roots file, using the software CA.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::eventually;
use meshroot::providers::DefaultProviderResolver;
use meshroot::store::{FileRootStore, RootEvent};
use meshroot::trust::{CertificateManager, Controller, Reconciler, TrustState};
use meshroot::TrustError;
use tokio_util::sync::CancellationToken;
use x509_parser::pem::parse_x509_pem;

fn roots_yaml(old: &str, new: Option<&str>) -> String {
    let mut yaml = format!(
        r#"roots:
  - name: osm-root-1
    trust_domain: cluster.local
    spiffe_enabled: true
    intent: {old}
    provider:
      type: software
      common_name: osm-ca-1.openservicemesh.io
"#
    );
    if let Some(new) = new {
        yaml.push_str(&format!(
            r#"  - name: osm-root-2
    trust_domain: cluster.local
    spiffe_enabled: true
    intent: {new}
    provider:
      type: software
      common_name: osm-ca-2.openservicemesh.io
"#
        ));
    }
    yaml
}

fn issuer_common_name(certificate_pem: &str) -> String {
    let (_, pem) = parse_x509_pem(certificate_pem.as_bytes()).unwrap();
    let cert = pem.parse_x509().unwrap();
    let issuer = cert.issuer().iter_common_name().next().unwrap();
    issuer.as_str().unwrap().to_string()
}

#[tokio::test]
async fn rotation_through_roots_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roots.yaml");
    std::fs::write(&path, roots_yaml("active", None)).unwrap();

    let store = Arc::new(FileRootStore::new(&path));
    let state = Arc::new(TrustState::new());
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        Arc::new(DefaultProviderResolver::new()),
        state.clone(),
    ));
    let manager = CertificateManager::new(state.clone(), Duration::from_secs(3600));

    let cancel = CancellationToken::new();
    let watcher = store.clone().watch(Duration::from_millis(20), cancel.clone());
    let controller = tokio::spawn(
        Controller::new(reconciler)
            .with_resync_interval(Some(Duration::from_millis(50)))
            .run(cancel.clone()),
    );

    let signing_is = |name: &'static str| {
        let state = state.clone();
        move || state.signing_issuer().is_some_and(|issuer| issuer.id() == name)
    };
    let validating_is = |name: &'static str| {
        let state = state.clone();
        move || state.validating_issuer().is_some_and(|issuer| issuer.id() == name)
    };

    eventually(signing_is("osm-root-1"), "bootstrap on osm-root-1").await;
    let leaf = manager.issue_certificate("bookstore", None).await.unwrap();
    assert_eq!(leaf.issuer_id, "osm-root-1");
    assert_eq!(issuer_common_name(&leaf.certificate_pem), "osm-ca-1.openservicemesh.io");

    // Introduce the new root for validation.
    std::fs::write(&path, roots_yaml("active", Some("passive"))).unwrap();
    eventually(validating_is("osm-root-2"), "osm-root-2 trusted for validation").await;
    assert_eq!(manager.trust_bundle().unwrap().matches("BEGIN CERTIFICATE").count(), 2);
    let leaf = manager.issue_certificate("bookstore", None).await.unwrap();
    assert_eq!(leaf.issuer_id, "osm-root-1");

    // Switch signing to the new root.
    std::fs::write(&path, roots_yaml("passive", Some("active"))).unwrap();
    eventually(signing_is("osm-root-2"), "osm-root-2 signing").await;
    let leaf = manager.issue_certificate("bookstore", None).await.unwrap();
    assert_eq!(issuer_common_name(&leaf.certificate_pem), "osm-ca-2.openservicemesh.io");

    // Retire the old root.
    std::fs::write(&path, roots_yaml("inactive", Some("active"))).unwrap();
    eventually(validating_is("osm-root-2"), "osm-root-1 retired").await;
    eventually(
        || manager.trust_bundle().is_some_and(|bundle| bundle.matches("BEGIN CERTIFICATE").count() == 1),
        "single-root bundle",
    )
    .await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), async {
        watcher.await.unwrap();
        controller.await.unwrap();
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn invalid_file_keeps_last_known_good_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roots.yaml");
    std::fs::write(&path, roots_yaml("active", None)).unwrap();

    let store = Arc::new(FileRootStore::new(&path));
    let state = Arc::new(TrustState::new());
    let reconciler = Reconciler::new(store.clone(), Arc::new(DefaultProviderResolver::new()), state.clone());

    reconciler.reconcile(&RootEvent::resync()).await.unwrap();
    let before = state.snapshot().unwrap();

    std::fs::write(&path, "roots: [").unwrap();
    assert!(reconciler.reconcile(&RootEvent::resync()).await.is_err());

    std::fs::write(&path, roots_yaml("passive", Some("passive"))).unwrap();
    assert!(reconciler.reconcile(&RootEvent::resync()).await.is_err());

    assert!(Arc::ptr_eq(&before, &state.snapshot().unwrap()));
}

#[tokio::test]
async fn out_of_range_root_validity_fails_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roots.yaml");
    let yaml = roots_yaml("active", None).replace(
        "      common_name: osm-ca-1.openservicemesh.io\n",
        "      common_name: osm-ca-1.openservicemesh.io\n      validity_days: 4294967295\n",
    );
    std::fs::write(&path, yaml).unwrap();

    let store = Arc::new(FileRootStore::new(&path));
    let state = Arc::new(TrustState::new());
    let reconciler = Reconciler::new(store, Arc::new(DefaultProviderResolver::new()), state.clone());

    let err = reconciler.reconcile(&RootEvent::resync()).await.unwrap_err();
    assert!(matches!(err, TrustError::ProviderResolutionFailed { ref root, .. } if root == "osm-root-1"));
    assert!(state.snapshot().is_none());

    // The same reconciler converges once the declaration is fixed.
    std::fs::write(&path, roots_yaml("active", None)).unwrap();
    reconciler.reconcile(&RootEvent::resync()).await.unwrap();
    assert_eq!(state.signing_issuer().unwrap().id(), "osm-root-1");
}

#[tokio::test]
async fn roots_file_created_after_startup_is_reconciled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roots.yaml");

    let store = Arc::new(FileRootStore::new(&path));
    let state = Arc::new(TrustState::new());
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        Arc::new(DefaultProviderResolver::new()),
        state.clone(),
    ));

    let cancel = CancellationToken::new();
    let watcher = store.clone().watch(Duration::from_millis(20), cancel.clone());
    // No periodic resync: only the watcher can wake the controller.
    let controller = tokio::spawn(Controller::new(reconciler).with_resync_interval(None).run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(state.snapshot().is_none());

    std::fs::write(&path, roots_yaml("active", None)).unwrap();
    eventually(
        || state.signing_issuer().is_some_and(|issuer| issuer.id() == "osm-root-1"),
        "roots file picked up after startup",
    )
    .await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), async {
        watcher.await.unwrap();
        controller.await.unwrap();
    })
    .await
    .unwrap();
}
