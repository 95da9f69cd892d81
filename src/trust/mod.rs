//! # Trust Root Rotation
//!
//! Decides which root signs new workload certificates and which root is
//! trusted for validation while one or two roots coexist during a rotation.
//!
//! ```text
//! store event -> Controller -> Reconciler
//!                                |- list roots           (RootStore)
//!                                |- resolve_desired_roots (pure)
//!                                |- guard::evaluate       (skip or apply)
//!                                |- IssuerResolver        (ProviderResolver)
//!                                '- TrustState::commit    (both roles at once)
//! ```
//!
//! | Declared intents        | Signing  | Validating |
//! |-------------------------|----------|------------|
//! | `active`                | it       | it         |
//! | `active` + `passive`    | active   | passive    |
//! | `active` + `active`     | first    | second     |
//! | anything else           | error    | error      |
//!
//! Inactive roots are dropped before any of the above. When both roots are
//! active, listing order may flip between passes; the guard treats a swapped
//! pair as already installed.

pub mod controller;
pub mod desired;
pub mod guard;
pub mod manager;
pub mod reconciler;
pub mod resolver;
pub mod state;

pub use controller::Controller;
pub use desired::{resolve_desired_roots, DesiredRoots};
pub use guard::GuardDecision;
pub use manager::CertificateManager;
pub use reconciler::{ReconcileOutcome, ReconcilePhase, Reconciler};
pub use resolver::IssuerResolver;
pub use state::{IssuerPair, TrustState};
