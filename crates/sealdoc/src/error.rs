//! Error types for the client pipeline.

use std::time::Duration;

use sealdoc_envelope::EnvelopeError;
use sealdoc_perms::PermsError;
use sealdoc_registry::RegistryError;
use thiserror::Error;

/// Errors that halt a client step.
///
/// Nothing is retried; the step that failed is the step reported.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The registry rejected the operation.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Secret submission or recovery failed.
    #[error("secret error: {0}")]
    Secret(#[from] PermsError),

    /// The body could not be encrypted or decrypted.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// The engine did not disclose the secret in time.
    #[error("secret disclosure timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Whether this is a body that did not decrypt under the recovered secret.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, ClientError::Envelope(EnvelopeError::DecryptionFailed))
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
