//! Error types for the store module.

use sealdoc_core::DocumentId;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Ledger entry serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] sealdoc_core::CoreError),

    /// A commit referenced a document that does not exist.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// Every document id up to `DocumentId::MAX` has been assigned.
    #[error("document id space exhausted after {0}")]
    IdSpaceExhausted(DocumentId),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A blocking storage task failed to complete.
    #[error("background task failed: {0}")]
    Background(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
