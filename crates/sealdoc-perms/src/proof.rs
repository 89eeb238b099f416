//! Engine inputs and capability proofs.
//!
//! A client that creates a document seals the fresh secret to the engine's
//! X25519 input key ([`ExternalCiphertext`]) and signs a [`CapabilityProof`]
//! over the ciphertext digest, its own principal and the registry context.
//! Both travel to the registry as opaque bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use sealdoc_core::{ContextId, Keypair, Principal, Signature};

use crate::crypto::{SealedBox, X25519PublicKey, X25519StaticSecret};
use crate::error::{PermsError, Result};
use crate::secret::SecretValue;

const INPUT_PURPOSE: &str = "engine-input";

/// A secret sealed to the engine's input key, bound to one registry context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCiphertext(pub SealedBox);

impl ExternalCiphertext {
    /// Seal a secret for the engine.
    pub fn seal(
        secret: &SecretValue,
        engine_key: &X25519PublicKey,
        context: &ContextId,
    ) -> Result<Self> {
        SealedBox::seal(
            engine_key,
            INPUT_PURPOSE,
            context.as_bytes(),
            secret.as_str().as_bytes(),
        )
        .map(Self)
    }

    /// Open with the engine's input secret. Only the engine can do this.
    pub fn open(
        &self,
        engine_secret: &X25519StaticSecret,
        context: &ContextId,
    ) -> Result<SecretValue> {
        let plaintext = self.0.open(engine_secret, INPUT_PURPOSE, context.as_bytes())?;
        SecretValue::from_utf8(plaintext)
            .ok_or_else(|| PermsError::DecryptionError("secret is not utf-8".to_string()))
    }

    /// Digest the capability proof signs, independent of the wire encoding.
    pub fn digest(&self) -> [u8; 32] {
        self.0.digest("sealdoc-perms-v1-input-digest")
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| PermsError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| PermsError::SerializationError(e.to_string()))
    }
}

/// Evidence that a submitter authorized importing a ciphertext into one
/// registry context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProof(pub Signature);

impl CapabilityProof {
    /// The message a proof signs.
    pub fn message(
        context: &ContextId,
        submitter: &Principal,
        ciphertext: &ExternalCiphertext,
    ) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key("sealdoc-perms-v1-capability-proof");
        hasher.update(context.as_bytes());
        hasher.update(submitter.as_bytes());
        hasher.update(&ciphertext.digest());
        *hasher.finalize().as_bytes()
    }

    /// Sign a proof as the submitter.
    pub fn sign(keypair: &Keypair, context: &ContextId, ciphertext: &ExternalCiphertext) -> Self {
        let message = Self::message(context, &keypair.public_key(), ciphertext);
        Self(keypair.sign(&message))
    }

    /// Check that this proof binds `ciphertext` to `submitter` and `context`.
    pub fn verify(
        &self,
        context: &ContextId,
        submitter: &Principal,
        ciphertext: &ExternalCiphertext,
    ) -> Result<()> {
        let message = Self::message(context, submitter, ciphertext);
        submitter
            .verify(&message, &self.0)
            .map_err(|e| PermsError::ProofInvalid(e.to_string()))
    }

    /// The 64 signature bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    /// Parse from opaque proof bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Signature::from_slice(bytes)
            .map(Self)
            .map_err(|e| PermsError::ProofInvalid(e.to_string()))
    }
}

/// Opaque ciphertext and proof ready to submit with a new document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedInput {
    pub ciphertext: Bytes,
    pub proof: Bytes,
}

/// Client-side helper producing engine inputs for one registry.
#[derive(Debug, Clone, Copy)]
pub struct InputEncryptor {
    engine_key: X25519PublicKey,
    context: ContextId,
}

impl InputEncryptor {
    pub fn new(engine_key: X25519PublicKey, context: ContextId) -> Self {
        Self {
            engine_key,
            context,
        }
    }

    /// Seal `secret` for the engine and prove `submitter` authorized it.
    pub fn encrypt(&self, secret: &SecretValue, submitter: &Keypair) -> Result<EncryptedInput> {
        let ciphertext = ExternalCiphertext::seal(secret, &self.engine_key, &self.context)?;
        let proof = CapabilityProof::sign(submitter, &self.context, &ciphertext);

        Ok(EncryptedInput {
            ciphertext: Bytes::from(ciphertext.to_bytes()?),
            proof: Bytes::from(proof.to_bytes()),
        })
    }
}
