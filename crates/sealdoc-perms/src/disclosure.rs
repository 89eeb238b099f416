//! Secret disclosure to permitted principals.
//!
//! A principal that holds decrypt permission on a handle signs a
//! [`DisclosureRequest`] naming an X25519 key it controls. The engine checks
//! the signature and its own permission table, then returns the secret
//! sealed to that key as a [`SealedSecret`].

use serde::{Deserialize, Serialize};

use sealdoc_core::{Keypair, Principal, SecretHandle, Signature};

use crate::crypto::{SealedBox, X25519PublicKey, X25519StaticSecret};
use crate::error::{PermsError, Result};
use crate::secret::SecretValue;

const DISCLOSURE_PURPOSE: &str = "disclosure";

/// A signed request to recover the secret behind a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureRequest {
    pub handle: SecretHandle,
    pub requester: Principal,
    /// Key the secret will be sealed to.
    pub recipient_key: X25519PublicKey,
    pub signature: Signature,
}

impl DisclosureRequest {
    fn message(
        handle: &SecretHandle,
        requester: &Principal,
        recipient_key: &X25519PublicKey,
    ) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key("sealdoc-perms-v1-disclosure-request");
        hasher.update(handle.as_bytes());
        hasher.update(requester.as_bytes());
        hasher.update(recipient_key.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Build and sign a request as `requester`.
    pub fn sign(requester: &Keypair, handle: SecretHandle, recipient_key: X25519PublicKey) -> Self {
        let principal = requester.public_key();
        let signature = requester.sign(&Self::message(&handle, &principal, &recipient_key));
        Self {
            handle,
            requester: principal,
            recipient_key,
            signature,
        }
    }

    /// Check the requester's signature.
    pub fn verify(&self) -> Result<()> {
        let message = Self::message(&self.handle, &self.requester, &self.recipient_key);
        self.requester.verify(&message, &self.signature)?;
        Ok(())
    }
}

/// A secret sealed to one recipient key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// The handle this secret belongs to; also the sealing binding.
    pub handle: SecretHandle,
    pub sealed: SealedBox,
}

impl SealedSecret {
    /// Seal `secret` to `recipient_key`.
    pub fn seal(
        secret: &SecretValue,
        handle: SecretHandle,
        recipient_key: &X25519PublicKey,
    ) -> Result<Self> {
        let sealed = SealedBox::seal(
            recipient_key,
            DISCLOSURE_PURPOSE,
            handle.as_bytes(),
            secret.as_str().as_bytes(),
        )?;
        Ok(Self { handle, sealed })
    }

    /// Open with the recipient's X25519 secret.
    pub fn open(&self, recipient_secret: &X25519StaticSecret) -> Result<SecretValue> {
        let plaintext =
            self.sealed
                .open(recipient_secret, DISCLOSURE_PURPOSE, self.handle.as_bytes())?;
        SecretValue::from_utf8(plaintext)
            .ok_or_else(|| PermsError::DecryptionError("secret is not utf-8".to_string()))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_signature_verifies() {
        let requester = Keypair::generate();
        let recipient = X25519StaticSecret::generate();
        let request =
            DisclosureRequest::sign(&requester, SecretHandle::generate(), recipient.public_key());

        request.verify().unwrap();
    }

    #[test]
    fn test_request_with_swapped_requester_fails() {
        let requester = Keypair::generate();
        let recipient = X25519StaticSecret::generate();
        let mut request =
            DisclosureRequest::sign(&requester, SecretHandle::generate(), recipient.public_key());

        request.requester = Keypair::generate().public_key();
        assert!(request.verify().is_err());
    }

    #[test]
    fn test_request_with_swapped_recipient_key_fails() {
        let requester = Keypair::generate();
        let recipient = X25519StaticSecret::generate();
        let mut request =
            DisclosureRequest::sign(&requester, SecretHandle::generate(), recipient.public_key());

        request.recipient_key = X25519StaticSecret::generate().public_key();
        assert!(request.verify().is_err());
    }

    #[test]
    fn test_sealed_secret_roundtrip() {
        let recipient = X25519StaticSecret::generate();
        let secret = SecretValue::generate();
        let handle = SecretHandle::generate();

        let sealed = SealedSecret::seal(&secret, handle, &recipient.public_key()).unwrap();
        assert_eq!(sealed.open(&recipient).unwrap(), secret);

        let bytes = sealed.to_bytes().unwrap();
        assert_eq!(SealedSecret::from_bytes(&bytes).unwrap(), sealed);
    }

    #[test]
    fn test_sealed_secret_wrong_recipient_fails() {
        let recipient = X25519StaticSecret::generate();
        let sealed = SealedSecret::seal(
            &SecretValue::generate(),
            SecretHandle::generate(),
            &recipient.public_key(),
        )
        .unwrap();

        assert!(sealed.open(&X25519StaticSecret::generate()).is_err());
    }

    #[test]
    fn test_sealed_secret_bound_to_handle() {
        let recipient = X25519StaticSecret::generate();
        let mut sealed = SealedSecret::seal(
            &SecretValue::generate(),
            SecretHandle::generate(),
            &recipient.public_key(),
        )
        .unwrap();

        sealed.handle = SecretHandle::generate();
        assert!(sealed.open(&recipient).is_err());
    }
}
