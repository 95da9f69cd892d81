//! Reconciliation pass orchestration.
//!
//! One pass lists the declared roots, picks the desired pair, asks the
//! idempotence guard whether anything changed, resolves issuers, and commits.
//! Every fallible step runs before the commit, so a failed pass leaves Trust
//! State exactly as it found it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn, Instrument};

use super::desired::resolve_desired_roots;
use super::guard::{self, GuardDecision};
use super::resolver::IssuerResolver;
use super::state::TrustState;
use crate::errors::TrustError;
use crate::observability::MetricsRecorder;
use crate::providers::ProviderResolver;
use crate::store::{RootEvent, RootStore};

/// Where the reconciler currently is in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Idle,
    Resolving,
    Committing,
}

/// Result of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The installed pair already satisfies the declarations.
    Unchanged { decision: GuardDecision },
    /// A new pair was installed.
    Committed { signing: String, validating: String },
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged { .. } => "unchanged",
            Self::Committed { .. } => "committed",
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resets the published phase to idle when a pass ends, including on error.
struct PhaseGuard<'a> {
    phase: &'a watch::Sender<ReconcilePhase>,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a watch::Sender<ReconcilePhase>, next: ReconcilePhase) -> Self {
        phase.send_replace(next);
        Self { phase }
    }

    fn advance(&self, next: ReconcilePhase) {
        self.phase.send_replace(next);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(ReconcilePhase::Idle);
    }
}

/// Drives Trust State towards the declared roots.
pub struct Reconciler {
    store: Arc<dyn RootStore>,
    issuers: IssuerResolver,
    state: Arc<TrustState>,
    pass_lock: Mutex<()>,
    phase: watch::Sender<ReconcilePhase>,
    metrics: MetricsRecorder,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RootStore>, provider: Arc<dyn ProviderResolver>, state: Arc<TrustState>) -> Self {
        let (phase, _) = watch::channel(ReconcilePhase::Idle);
        Self {
            store,
            issuers: IssuerResolver::new(provider),
            state,
            pass_lock: Mutex::new(()),
            phase,
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn state(&self) -> &Arc<TrustState> {
        &self.state
    }

    pub fn store(&self) -> &Arc<dyn RootStore> {
        &self.store
    }

    /// Observe phase transitions.
    pub fn subscribe_phase(&self) -> watch::Receiver<ReconcilePhase> {
        self.phase.subscribe()
    }

    /// Run one pass. The event only wakes the reconciler; the full root set is
    /// always re-listed. Concurrent calls are serialized.
    pub async fn reconcile(&self, event: &RootEvent) -> Result<ReconcileOutcome, TrustError> {
        let span = crate::reconcile_span!(event.kind, root = %event.root_name);

        async {
            let result = self.run_pass().await;
            match &result {
                Ok(outcome) => {
                    self.metrics.record_reconcile(outcome.as_str());
                    debug!(outcome = %outcome, "Reconciliation pass finished");
                }
                Err(e) => {
                    self.metrics.record_reconcile(e.kind());
                    warn!(error = %e, kind = e.kind(), "Reconciliation failed, keeping current trust state");
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_pass(&self) -> Result<ReconcileOutcome, TrustError> {
        let _pass = self.pass_lock.lock().await;
        let phase = PhaseGuard::enter(&self.phase, ReconcilePhase::Resolving);

        let roots = self.store.list_roots().await.map_err(|source| TrustError::ListRootsFailed { source })?;
        let desired = resolve_desired_roots(roots)?;

        let installed = self.state.snapshot();
        let decision = guard::evaluate(&desired, installed.as_deref());
        if !decision.requires_update() {
            debug!(
                decision = %decision,
                signing = %desired.signing.name,
                validating = %desired.validating.name,
                "Trust state already up to date"
            );
            return Ok(ReconcileOutcome::Unchanged { decision });
        }

        let pair = self.issuers.resolve_pair(&desired, installed.as_deref()).await?;

        phase.advance(ReconcilePhase::Committing);
        let committed = self.state.commit(pair);
        self.metrics.record_commit(self.state.trust_roots().len());

        let signing = committed.signing().id().to_string();
        let validating = committed.validating().id().to_string();
        info!(
            decision = %decision,
            signing = %signing,
            validating = %validating,
            "Committed new trust state"
        );

        Ok(ReconcileOutcome::Committed { signing, validating })
    }
}
