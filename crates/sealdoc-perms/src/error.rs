//! Error types for the permissions module.

use sealdoc_core::{Principal, SecretHandle};
use thiserror::Error;

/// Errors that can occur during gateway and engine operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The capability proof does not bind the ciphertext to the submitter
    /// and context, or the ciphertext itself is malformed.
    #[error("capability proof invalid: {0}")]
    ProofInvalid(String),

    /// The principal does not hold decrypt permission on the handle.
    #[error("principal {principal} is not permitted on secret {handle}")]
    Unauthorized {
        principal: Principal,
        handle: SecretHandle,
    },

    /// The engine has no secret under this handle.
    #[error("unknown secret handle: {0}")]
    UnknownHandle(SecretHandle),

    /// The engine could not be reached or answered with an error.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Encryption error.
    #[error("encryption error: {0}")]
    EncryptionError(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    DecryptionError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Core error.
    #[error("core error: {0}")]
    CoreError(#[from] sealdoc_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
