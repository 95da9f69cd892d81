//! Domain types shared by the reconciler, the stores, and the providers.

pub mod issuer;
pub mod provider;
pub mod root;
pub mod secret;

pub use issuer::Issuer;
pub use provider::{ProviderConfig, ProviderKind, SoftwareCaConfig, VaultPkiConfig};
pub use root::{RootDeclaration, RootIntent};
pub use secret::SecretString;
