//! In-memory confidential engine.
//!
//! Holds secrets and their permission sets in process memory. Used by tests
//! and single-process deployments; it has the same observable semantics a
//! remote engine must have, without any homomorphic machinery.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use sealdoc_core::{ContextId, Principal, SecretHandle};

use crate::crypto::{X25519PublicKey, X25519StaticSecret};
use crate::disclosure::{DisclosureRequest, SealedSecret};
use crate::engine::{ConfidentialEngine, DisclosureService};
use crate::error::{PermsError, Result};
use crate::proof::{CapabilityProof, ExternalCiphertext};
use crate::secret::SecretValue;

/// In-memory engine implementation. Thread-safe via RwLock.
pub struct MemoryEngine {
    input_secret: X25519StaticSecret,
    inner: RwLock<MemoryEngineInner>,
}

#[derive(Default)]
struct MemoryEngineInner {
    /// Secrets indexed by handle.
    secrets: HashMap<SecretHandle, SecretValue>,

    /// Permission sets indexed by handle.
    acl: HashMap<SecretHandle, HashSet<Principal>>,
}

impl MemoryEngine {
    /// Create an engine with a fresh input key.
    pub fn new() -> Self {
        Self::with_input_secret(X25519StaticSecret::generate())
    }

    /// Create an engine with a known input key.
    pub fn with_input_secret(input_secret: X25519StaticSecret) -> Self {
        Self {
            input_secret,
            inner: RwLock::new(MemoryEngineInner::default()),
        }
    }

    /// The key clients seal secrets to before import.
    pub fn input_public_key(&self) -> X25519PublicKey {
        self.input_secret.public_key()
    }

    /// Number of secrets in custody.
    pub fn secret_count(&self) -> Result<usize> {
        Ok(self.read()?.secrets.len())
    }

    /// Principals permitted on a handle, in no particular order.
    pub fn permitted(&self, handle: &SecretHandle) -> Result<Vec<Principal>> {
        Ok(self
            .read()?
            .acl
            .get(handle)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryEngineInner>> {
        self.inner
            .read()
            .map_err(|_| PermsError::EngineUnavailable("engine lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryEngineInner>> {
        self.inner
            .write()
            .map_err(|_| PermsError::EngineUnavailable("engine lock poisoned".to_string()))
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfidentialEngine for MemoryEngine {
    async fn import(
        &self,
        ciphertext: &ExternalCiphertext,
        proof: &CapabilityProof,
        submitter: &Principal,
        context: &ContextId,
    ) -> Result<SecretHandle> {
        proof.verify(context, submitter, ciphertext)?;

        // A proven ciphertext that does not open is still not importable.
        let secret = ciphertext
            .open(&self.input_secret, context)
            .map_err(|e| PermsError::ProofInvalid(e.to_string()))?;

        let handle = SecretHandle::generate();
        let mut inner = self.write()?;
        inner.secrets.insert(handle, secret);
        inner.acl.insert(handle, HashSet::new());

        debug!(%handle, %submitter, "secret imported");
        Ok(handle)
    }

    async fn allow(&self, handle: &SecretHandle, principal: &Principal) -> Result<()> {
        let mut inner = self.write()?;
        let set = inner
            .acl
            .get_mut(handle)
            .ok_or(PermsError::UnknownHandle(*handle))?;

        if set.insert(*principal) {
            debug!(%handle, %principal, "permission granted");
        }
        Ok(())
    }

    async fn is_allowed(&self, handle: &SecretHandle, principal: &Principal) -> Result<bool> {
        Ok(self
            .read()?
            .acl
            .get(handle)
            .map(|set| set.contains(principal))
            .unwrap_or(false))
    }
}

#[async_trait]
impl DisclosureService for MemoryEngine {
    async fn disclose(&self, request: &DisclosureRequest) -> Result<SealedSecret> {
        request.verify()?;

        let inner = self.read()?;
        let permitted = inner
            .acl
            .get(&request.handle)
            .map(|set| set.contains(&request.requester))
            .unwrap_or(false);
        if !permitted {
            return Err(PermsError::Unauthorized {
                principal: request.requester,
                handle: request.handle,
            });
        }

        let secret = inner
            .secrets
            .get(&request.handle)
            .ok_or(PermsError::UnknownHandle(request.handle))?;

        SealedSecret::seal(secret, request.handle, &request.recipient_key)
    }
}
