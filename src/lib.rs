//! # meshroot
//!
//! Trust-root rotation engine for a service-mesh control plane. It decides which
//! certificate authority signs newly issued workload certificates and which one
//! is trusted for validation while one or two roots coexist during a
//! zero-downtime rotation.
//!
//! ## Architecture
//!
//! ```text
//! RootStore ──events──▶ Controller ──▶ Reconciler ──commit──▶ TrustState ──▶ CertificateManager
//!                                         │
//!                                         └── ProviderResolver (software CA, Vault PKI)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshroot::providers::DefaultProviderResolver;
//! use meshroot::store::{FileRootStore, RootEvent};
//! use meshroot::trust::{Reconciler, TrustState};
//!
//! #[tokio::main]
//! async fn main() -> meshroot::Result<()> {
//!     let store = Arc::new(FileRootStore::new("roots.yaml"));
//!     let state = Arc::new(TrustState::new());
//!     let reconciler = Reconciler::new(store, Arc::new(DefaultProviderResolver::new()), state.clone());
//!
//!     reconciler.reconcile(&RootEvent::resync()).await?;
//!     println!("signing root: {:?}", state.signing_issuer().map(|issuer| issuer.id().to_string()));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod providers;
pub mod store;
pub mod trust;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result, TrustError};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
