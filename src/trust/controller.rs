//! Notification dispatcher.
//!
//! A single task turns store events and periodic re-syncs into reconciliation
//! passes. Failures are logged and the loop keeps going; the next event or
//! re-sync is the retry.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::reconciler::Reconciler;
use crate::store::RootEvent;

/// Serializes root change notifications into reconciliation passes.
pub struct Controller {
    reconciler: Arc<Reconciler>,
    events: broadcast::Receiver<RootEvent>,
    resync_interval: Option<Duration>,
}

impl Controller {
    /// Subscribes to the reconciler's store.
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        let events = reconciler.store().subscribe();
        Self { reconciler, events, resync_interval: None }
    }

    /// Reconcile every `interval` even without events. `None` disables re-syncs.
    pub fn with_resync_interval(mut self, interval: Option<Duration>) -> Self {
        self.resync_interval = interval.filter(|period| !period.is_zero());
        self
    }

    /// Reconcile once, then on every event or re-sync until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let Controller { reconciler, mut events, resync_interval } = self;

        info!(
            resync_interval_seconds = resync_interval.map(|period| period.as_secs()),
            "Starting root reconciliation controller"
        );

        reconcile(&reconciler, &RootEvent::resync()).await;

        let mut ticker = resync_interval.map(|period| {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                received = events.recv() => match received {
                    Ok(event) => reconcile(&reconciler, &event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dropped root change notifications, re-syncing");
                        reconcile(&reconciler, &RootEvent::resync()).await;
                    }
                    Err(RecvError::Closed) => {
                        warn!("Root change notification channel closed");
                        break;
                    }
                },

                _ = tick(&mut ticker) => reconcile(&reconciler, &RootEvent::resync()).await,
            }
        }

        info!("Root reconciliation controller stopped");
    }
}

async fn reconcile(reconciler: &Reconciler, event: &RootEvent) {
    if let Err(e) = reconciler.reconcile(event).await {
        error!(
            error = %e,
            kind = e.kind(),
            trigger = %event.kind,
            root = %event.root_name,
            "Reconciliation pass failed"
        );
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
