//! Error types for contract verification
//!
//! Recursion and access errors abort the verification of one type entirely.
//! Precondition errors are raised while the configuration is built, before any
//! instance is synthesized. Contract violations are normally carried inside a
//! report; they only become an error when a caller asks for strict
//! verification.

use crate::types::TypeStack;

/// Type alias for verification results
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Everything that can stop a verification run
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// A type cycle was found and no terminating prefab value exists for it
    #[error("Recursive datastructure.\nAdd prefab values for one of the following types: {stack}.")]
    Recursion { stack: TypeStack },

    /// A field or value could not be read, written or converted
    #[error("Access error: {message}")]
    Access { message: String },

    /// The configuration is invalid or contradicts itself
    #[error("Precondition: {message}")]
    Precondition { message: String },

    /// One type broke the equality contract
    #[error("{message}")]
    ContractViolation { message: String },

    /// One or more types of a batch broke the equality contract
    #[error("{message}")]
    Batch { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VerifierError {
    pub fn access(message: impl Into<String>) -> Self {
        VerifierError::Access { message: message.into() }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        VerifierError::Precondition { message: message.into() }
    }

    /// Whether this error aborts the verification of a single type (as
    /// opposed to describing contract violations)
    pub fn aborts_type(&self) -> bool {
        matches!(
            self,
            VerifierError::Recursion { .. } | VerifierError::Access { .. } | VerifierError::Precondition { .. }
        )
    }
}
