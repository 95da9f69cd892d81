//! # Error Handling
//!
//! Crate-level error type for the meshroot binary and its wiring code, plus the
//! reconciliation error taxonomy in [`trust`]. The per-collaborator errors
//! (`StoreError`, `ProviderError`) live next to their traits.

pub mod trust;

pub use trust::TrustError;

/// Custom result type for meshroot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the meshroot control plane component
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reconciliation and issuance errors
    #[error(transparent)]
    Trust(#[from] TrustError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::config("missing roots file");
        assert!(matches!(error, Error::Config(_)));
        assert_eq!(error.to_string(), "Configuration error: missing roots file");
    }

    #[test]
    fn test_trust_error_is_transparent() {
        let error: Error = TrustError::NoRootsFound.into();
        assert_eq!(error.to_string(), TrustError::NoRootsFound.to_string());
    }
}
