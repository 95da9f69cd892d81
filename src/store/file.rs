//! YAML file root store.
//!
//! The file holds a single document:
//!
//! ```yaml
//! roots:
//!   - name: osm-mesh-root-certificate
//!     trust_domain: cluster.local
//!     intent: active
//!     provider:
//!       type: software
//!       common_name: osm-ca.openservicemesh.io
//! ```
//!
//! Every listing re-reads the file. [`FileRootStore::watch`] polls it and
//! broadcasts one event per root that was added, changed, or removed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

use super::{RootEvent, RootEventKind, RootStore, StoreError, EVENT_CHANNEL_CAPACITY};
use crate::domain::RootDeclaration;

#[derive(Debug, Deserialize)]
struct RootsDocument {
    roots: Vec<RootDeclaration>,
}

/// What the watcher has observed so far.
#[derive(Debug, Default)]
struct PollState {
    polled: bool,
    /// Last file contents that parsed and validated
    last_seen: Option<Vec<RootDeclaration>>,
}

/// Root declarations read from a YAML file.
#[derive(Debug)]
pub struct FileRootStore {
    path: PathBuf,
    events: broadcast::Sender<RootEvent>,
    poll_state: Mutex<PollState>,
}

impl FileRootStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { path: path.into(), events, poll_state: Mutex::new(PollState::default()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<RootDeclaration>, StoreError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
        parse_roots(&self.path, &contents)
    }

    /// Re-read the file, broadcast what changed since the previous poll, and
    /// return the emitted events.
    ///
    /// A first poll that succeeds only records a baseline. If the file was
    /// missing or invalid on earlier polls, the first valid read emits a resync.
    pub async fn poll_changes(&self) -> Result<Vec<RootEvent>, StoreError> {
        let loaded = self.load().await;
        let mut state = self.poll_state.lock().await;
        let first_poll = !state.polled;
        state.polled = true;
        let current = loaded?;

        let events = match state.last_seen.as_ref() {
            Some(previous) => diff_roots(previous, &current),
            None if first_poll => Vec::new(),
            None => vec![RootEvent::resync()],
        };
        state.last_seen = Some(current);
        drop(state);

        for event in &events {
            debug!(root = %event.root_name, kind = %event.kind, "Root declaration file changed");
            let _ = self.events.send(event.clone());
        }
        Ok(events)
    }

    /// Poll the file every `interval` until `cancel` fires.
    pub fn watch(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(path = %self.path.display(), interval_ms = interval.as_millis() as u64, "Watching root declaration file");
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.poll_changes().await {
                            warn!(error = %e, path = %self.path.display(), "Failed to poll root declaration file");
                        }
                    }
                }
            }
            debug!(path = %self.path.display(), "Stopped watching root declaration file");
        })
    }
}

#[async_trait]
impl RootStore for FileRootStore {
    async fn list_roots(&self) -> Result<Vec<RootDeclaration>, StoreError> {
        self.load().await
    }

    fn subscribe(&self) -> broadcast::Receiver<RootEvent> {
        self.events.subscribe()
    }
}

fn parse_roots(path: &Path, contents: &str) -> Result<Vec<RootDeclaration>, StoreError> {
    let document: RootsDocument = serde_yaml::from_str(contents)
        .map_err(|source| StoreError::Parse { path: path.to_path_buf(), source })?;

    let mut names = HashSet::new();
    for root in &document.roots {
        root.validate().map_err(|e| StoreError::invalid(&root.name, e.to_string()))?;
        if !names.insert(root.name.as_str()) {
            return Err(StoreError::invalid(&root.name, "duplicate root name"));
        }
    }
    Ok(document.roots)
}

fn diff_roots(previous: &[RootDeclaration], current: &[RootDeclaration]) -> Vec<RootEvent> {
    let mut events = Vec::new();
    for root in current {
        match previous.iter().find(|old| old.name == root.name) {
            None => events.push(RootEvent::new(&root.name, RootEventKind::Added)),
            Some(old) if old != root => events.push(RootEvent::new(&root.name, RootEventKind::Updated)),
            Some(_) => {}
        }
    }
    for old in previous {
        if !current.iter().any(|root| root.name == old.name) {
            events.push(RootEvent::new(&old.name, RootEventKind::Deleted));
        }
    }
    events
}
