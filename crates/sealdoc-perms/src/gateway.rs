//! The confidential key gateway.
//!
//! The registry's only route to the confidential engine. It turns opaque
//! submission bytes into an engine import and answers permission questions
//! about handles; it never sees a secret's value.

use std::sync::Arc;

use tracing::{debug, warn};

use sealdoc_core::{ContextId, Principal, SecretHandle};

use crate::engine::ConfidentialEngine;
use crate::error::{PermsError, Result};
use crate::proof::{CapabilityProof, ExternalCiphertext};

/// Bridge between submitted ciphertexts and the engine's permission model.
pub struct ConfidentialKeyGateway<E: ConfidentialEngine> {
    engine: Arc<E>,
    context: ContextId,
    custodian: Principal,
}

impl<E: ConfidentialEngine> ConfidentialKeyGateway<E> {
    /// Create a gateway for one registry context.
    ///
    /// The registry acts as [`Principal::custodian`] of that context.
    pub fn new(engine: Arc<E>, context: ContextId) -> Self {
        Self {
            engine,
            context,
            custodian: Principal::custodian(&context),
        }
    }

    /// The context proofs must be bound to.
    pub fn context(&self) -> &ContextId {
        &self.context
    }

    /// The principal the registry holds custody as.
    pub fn custodian(&self) -> &Principal {
        &self.custodian
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Import an externally encrypted secret.
    ///
    /// Both inputs are opaque bytes; anything that does not decode, or a
    /// proof that does not bind the ciphertext to `submitter` and this
    /// context, is `ProofInvalid`.
    pub async fn import_secret(
        &self,
        external_ciphertext: &[u8],
        capability_proof: &[u8],
        submitter: &Principal,
    ) -> Result<SecretHandle> {
        if submitter.is_null() {
            return Err(PermsError::ProofInvalid("null submitter".to_string()));
        }

        let ciphertext = ExternalCiphertext::from_bytes(external_ciphertext)
            .map_err(|e| PermsError::ProofInvalid(e.to_string()))?;
        let proof = CapabilityProof::from_bytes(capability_proof)?;

        let handle = self
            .engine
            .import(&ciphertext, &proof, submitter, &self.context)
            .await
            .map_err(|e| {
                warn!(%submitter, error = %e, "secret import rejected");
                e
            })?;

        debug!(%handle, %submitter, "secret imported through gateway");
        Ok(handle)
    }

    /// Grant the registry and the creating owner permanent decrypt permission.
    pub async fn grant_self_and_registry(
        &self,
        handle: &SecretHandle,
        owner: &Principal,
    ) -> Result<()> {
        self.engine.allow(handle, &self.custodian).await?;
        self.engine.allow(handle, owner).await
    }

    /// Grant `grantee` decrypt permission. Idempotent.
    pub async fn grant_principal(&self, handle: &SecretHandle, grantee: &Principal) -> Result<()> {
        self.engine.allow(handle, grantee).await
    }

    /// Fail with `Unauthorized` unless `caller` may decrypt `handle` right now.
    ///
    /// Always asks the engine; answers are never cached.
    pub async fn require_caller_permission(
        &self,
        handle: &SecretHandle,
        caller: &Principal,
    ) -> Result<()> {
        if self.engine.is_allowed(handle, caller).await? {
            Ok(())
        } else {
            Err(PermsError::Unauthorized {
                principal: *caller,
                handle: *handle,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use crate::proof::InputEncryptor;
    use crate::secret::SecretValue;
    use sealdoc_core::Keypair;

    fn gateway() -> ConfidentialKeyGateway<MemoryEngine> {
        ConfidentialKeyGateway::new(Arc::new(MemoryEngine::new()), ContextId::derive("gateway"))
    }

    async fn import(
        gateway: &ConfidentialKeyGateway<MemoryEngine>,
        submitter: &Keypair,
    ) -> Result<SecretHandle> {
        let input = InputEncryptor::new(gateway.engine().input_public_key(), *gateway.context())
            .encrypt(&SecretValue::generate(), submitter)?;
        gateway
            .import_secret(&input.ciphertext, &input.proof, &submitter.public_key())
            .await
    }

    #[tokio::test]
    async fn test_owner_and_custodian_permitted_after_grant() {
        let gateway = gateway();
        let owner = Keypair::generate();
        let handle = import(&gateway, &owner).await.unwrap();

        gateway
            .grant_self_and_registry(&handle, &owner.public_key())
            .await
            .unwrap();

        gateway
            .require_caller_permission(&handle, &owner.public_key())
            .await
            .unwrap();
        gateway
            .require_caller_permission(&handle, gateway.custodian())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_grant_self_and_registry_twice_is_harmless() {
        let gateway = gateway();
        let owner = Keypair::generate();
        let handle = import(&gateway, &owner).await.unwrap();

        gateway
            .grant_self_and_registry(&handle, &owner.public_key())
            .await
            .unwrap();
        gateway
            .grant_self_and_registry(&handle, &owner.public_key())
            .await
            .unwrap();

        assert_eq!(gateway.engine().permitted(&handle).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthorized_until_granted() {
        let gateway = gateway();
        let owner = Keypair::generate();
        let reader = Keypair::generate().public_key();
        let handle = import(&gateway, &owner).await.unwrap();
        gateway
            .grant_self_and_registry(&handle, &owner.public_key())
            .await
            .unwrap();

        let denied = gateway.require_caller_permission(&handle, &reader).await;
        assert!(matches!(denied, Err(PermsError::Unauthorized { .. })));

        gateway.grant_principal(&handle, &reader).await.unwrap();
        gateway
            .require_caller_permission(&handle, &reader)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_garbage_inputs_are_proof_invalid() {
        let gateway = gateway();
        let submitter = Keypair::generate().public_key();

        let result = gateway.import_secret(b"not cbor", &[0u8; 64], &submitter).await;
        assert!(matches!(result, Err(PermsError::ProofInvalid(_))));
    }

    #[tokio::test]
    async fn test_proof_for_other_context_rejected() {
        let gateway = gateway();
        let submitter = Keypair::generate();
        let input = InputEncryptor::new(
            gateway.engine().input_public_key(),
            ContextId::derive("some-other-registry"),
        )
        .encrypt(&SecretValue::generate(), &submitter)
        .unwrap();

        let result = gateway
            .import_secret(&input.ciphertext, &input.proof, &submitter.public_key())
            .await;
        assert!(matches!(result, Err(PermsError::ProofInvalid(_))));
    }

    #[tokio::test]
    async fn test_null_submitter_rejected() {
        let gateway = gateway();
        let result = gateway
            .import_secret(&[], &[0u8; 64], &Principal::NULL)
            .await;
        assert!(matches!(result, Err(PermsError::ProofInvalid(_))));
    }
}
