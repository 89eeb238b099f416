//! Error types for the envelope.

use thiserror::Error;

/// Errors that can occur while sealing or opening a body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Wrong key, corrupted payload, or truncated input. Deliberately
    /// carries no detail about which.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),
}

/// Result type for envelope operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
