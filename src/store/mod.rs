//! Root declaration stores.
//!
//! A [`RootStore`] lists the current root declarations and broadcasts a
//! [`RootEvent`] whenever one of them changes. Event payloads are advisory: the
//! reconciler treats every event as a wake-up signal and re-lists the full set.
//!
//! - [`InMemoryRootStore`]: mutable store for embedding and tests
//! - [`FileRootStore`]: YAML file polled for changes

pub mod file;
pub mod memory;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::RootDeclaration;

pub use file::FileRootStore;
pub use memory::InMemoryRootStore;

/// Capacity of store event channels.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Errors raised by root stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Root store unavailable: {message}")]
    Unavailable { message: String },

    /// The backing file could not be read.
    #[error("Failed to read root declarations from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a valid list of declarations.
    #[error("Failed to parse root declarations from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A declaration failed validation.
    #[error("Invalid root declaration '{name}': {message}")]
    Invalid { name: String, message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { name: name.into(), message: message.into() }
    }
}

/// What happened to a root declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootEventKind {
    Added,
    Updated,
    Deleted,
    /// Periodic or forced re-sync, not tied to a single change
    Resync,
}

impl RootEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Resync => "resync",
        }
    }
}

impl fmt::Display for RootEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change notification for one root declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootEvent {
    pub root_name: String,
    pub kind: RootEventKind,
}

impl RootEvent {
    pub fn new(root_name: impl Into<String>, kind: RootEventKind) -> Self {
        Self { root_name: root_name.into(), kind }
    }

    /// Event used for startup and periodic re-syncs.
    pub fn resync() -> Self {
        Self::new("*", RootEventKind::Resync)
    }
}

/// Source of root declarations and their change notifications.
#[async_trait]
pub trait RootStore: Send + Sync {
    /// List every declared root, inactive ones included, in store order.
    async fn list_roots(&self) -> Result<Vec<RootDeclaration>, StoreError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<RootEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resync_event() {
        let event = RootEvent::resync();
        assert_eq!(event.kind, RootEventKind::Resync);
        assert_eq!(event.kind.to_string(), "resync");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::invalid("osm-root", "Trust domain cannot be empty");
        assert_eq!(
            err.to_string(),
            "Invalid root declaration 'osm-root': Trust domain cannot be empty"
        );
    }
}
