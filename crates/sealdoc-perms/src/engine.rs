//! The confidential-compute engine interface.
//!
//! The engine is an external capability provider. The registry side needs
//! exactly three primitives from it; clients additionally need a way to
//! recover a secret they are permitted to decrypt.

use async_trait::async_trait;

use sealdoc_core::{ContextId, Principal, SecretHandle};

use crate::disclosure::{DisclosureRequest, SealedSecret};
use crate::error::Result;
use crate::proof::{CapabilityProof, ExternalCiphertext};

/// Permission engine holding encrypted secrets.
///
/// # Design Notes
///
/// - **Single source of truth**: who may decrypt a secret is answered only
///   here. Callers must not cache answers from [`is_allowed`].
/// - **Additive**: there is no way to withdraw a permission.
///
/// [`is_allowed`]: ConfidentialEngine::is_allowed
#[async_trait]
pub trait ConfidentialEngine: Send + Sync {
    /// Verify `proof` and take custody of the secret in `ciphertext`.
    ///
    /// Fails with `ProofInvalid` unless the proof binds the ciphertext to
    /// `submitter` and `context`.
    async fn import(
        &self,
        ciphertext: &ExternalCiphertext,
        proof: &CapabilityProof,
        submitter: &Principal,
        context: &ContextId,
    ) -> Result<SecretHandle>;

    /// Grant `principal` decrypt permission. Idempotent.
    async fn allow(&self, handle: &SecretHandle, principal: &Principal) -> Result<()>;

    /// Whether `principal` currently holds decrypt permission.
    async fn is_allowed(&self, handle: &SecretHandle, principal: &Principal) -> Result<bool>;
}

/// The engine's disclosure protocol, used by clients.
#[async_trait]
pub trait DisclosureService: Send + Sync {
    /// Return the secret sealed to the request's recipient key, if the
    /// requester is permitted.
    async fn disclose(&self, request: &DisclosureRequest) -> Result<SealedSecret>;
}

#[async_trait]
impl<E: ConfidentialEngine + ?Sized> ConfidentialEngine for std::sync::Arc<E> {
    async fn import(
        &self,
        ciphertext: &ExternalCiphertext,
        proof: &CapabilityProof,
        submitter: &Principal,
        context: &ContextId,
    ) -> Result<SecretHandle> {
        (**self).import(ciphertext, proof, submitter, context).await
    }

    async fn allow(&self, handle: &SecretHandle, principal: &Principal) -> Result<()> {
        (**self).allow(handle, principal).await
    }

    async fn is_allowed(&self, handle: &SecretHandle, principal: &Principal) -> Result<bool> {
        (**self).is_allowed(handle, principal).await
    }
}

#[async_trait]
impl<D: DisclosureService + ?Sized> DisclosureService for std::sync::Arc<D> {
    async fn disclose(&self, request: &DisclosureRequest) -> Result<SealedSecret> {
        (**self).disclose(request).await
    }
}
