//! In-memory root store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use super::{RootEvent, RootEventKind, RootStore, StoreError, EVENT_CHANNEL_CAPACITY};
use crate::domain::{RootDeclaration, RootIntent};

/// Mutable, ordered set of root declarations.
///
/// Listing returns declarations in insertion order; [`replace_all`] lets callers
/// control that order exactly.
///
/// [`replace_all`]: InMemoryRootStore::replace_all
#[derive(Debug)]
pub struct InMemoryRootStore {
    roots: RwLock<Vec<RootDeclaration>>,
    events: broadcast::Sender<RootEvent>,
    fail_next: AtomicBool,
}

impl Default for InMemoryRootStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRootStore {
    pub fn new() -> Self {
        Self::with_roots(Vec::new())
    }

    pub fn with_roots(roots: Vec<RootDeclaration>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { roots: RwLock::new(roots), events, fail_next: AtomicBool::new(false) }
    }

    /// Insert a declaration or replace the one with the same name in place.
    pub fn upsert(&self, root: RootDeclaration) {
        let name = root.name.clone();
        let kind = {
            let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
            match roots.iter_mut().find(|existing| existing.name == root.name) {
                Some(existing) => {
                    *existing = root;
                    RootEventKind::Updated
                }
                None => {
                    roots.push(root);
                    RootEventKind::Added
                }
            }
        };
        self.notify(RootEvent::new(name, kind));
    }

    /// Change the intent of a declared root. Returns false if no such root exists.
    pub fn set_intent(&self, name: &str, intent: RootIntent) -> bool {
        let updated = {
            let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
            match roots.iter_mut().find(|existing| existing.name == name) {
                Some(existing) => {
                    existing.intent = intent;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.notify(RootEvent::new(name, RootEventKind::Updated));
        }
        updated
    }

    /// Remove a declaration. Returns false if no such root exists.
    pub fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
            let before = roots.len();
            roots.retain(|existing| existing.name != name);
            roots.len() != before
        };
        if removed {
            self.notify(RootEvent::new(name, RootEventKind::Deleted));
        }
        removed
    }

    /// Replace every declaration, keeping the given order.
    pub fn replace_all(&self, roots: Vec<RootDeclaration>) {
        *self.roots.write().unwrap_or_else(PoisonError::into_inner) = roots;
        self.notify(RootEvent::resync());
    }

    /// Make the next listing fail with [`StoreError::Unavailable`].
    pub fn set_fail_next(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    fn notify(&self, event: RootEvent) {
        debug!(root = %event.root_name, kind = %event.kind, "Root declaration changed");
        // No subscribers is fine: nothing is reconciling yet.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl RootStore for InMemoryRootStore {
    async fn list_roots(&self) -> Result<Vec<RootDeclaration>, StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store configured to fail"));
        }
        Ok(self.roots.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<RootEvent> {
        self.events.subscribe()
    }
}
