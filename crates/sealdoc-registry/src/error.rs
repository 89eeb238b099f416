//! Error types for the registry.

use sealdoc_core::{DocumentId, Principal};
use sealdoc_perms::PermsError;
use sealdoc_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Every variant rejects the whole transaction: no record, index,
/// permission or notification change from it is visible.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A document needs a non-empty name.
    #[error("document name is required")]
    NameRequired,

    /// The null principal cannot be granted access.
    #[error("invalid grantee")]
    InvalidGrantee,

    /// No document with this id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The caller may not decrypt the document's secret.
    #[error("{caller} is not authorized on document {document}")]
    Unauthorized {
        caller: Principal,
        document: DocumentId,
    },

    /// The capability proof did not verify.
    #[error("capability proof invalid: {0}")]
    ProofInvalid(String),

    /// The configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The confidential engine failed.
    #[error("engine error: {0}")]
    Engine(PermsError),
}

impl From<PermsError> for RegistryError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::ProofInvalid(reason) => RegistryError::ProofInvalid(reason),
            other => RegistryError::Engine(other),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
