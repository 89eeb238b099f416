//! Sealing secrets to an X25519 key.
//!
//! A [`SealedBox`] is bytes encrypted to one recipient: a fresh ephemeral
//! X25519 key agrees a shared secret with the recipient, Blake3 turns it
//! into a ChaCha20-Poly1305 key bound to a purpose and a binding value, and
//! the box carries the ephemeral public key and nonce needed to reverse it.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{PermsError, Result};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// An X25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// An X25519 secret held by a recipient (the engine, or a client).
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(rand::thread_rng()))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey(*PublicKey::from(&self.0).as_bytes())
    }
}

impl std::fmt::Debug for X25519StaticSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X25519StaticSecret(public={:?})", self.public_key())
    }
}

/// Bytes encrypted to a single X25519 recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedBox {
    /// Sender's one-time public key.
    pub ephemeral_public: X25519PublicKey,
    pub nonce: [u8; NONCE_LEN],
    /// AEAD output, tag included.
    pub ciphertext: Vec<u8>,
}

impl SealedBox {
    /// Encrypt `plaintext` to `recipient`.
    ///
    /// `purpose` and `binding` feed the key derivation; opening with any
    /// other pair fails authentication.
    pub fn seal(
        recipient: &X25519PublicKey,
        purpose: &str,
        binding: &[u8],
        plaintext: &[u8],
    ) -> Result<Self> {
        let ephemeral = EphemeralSecret::random_from_rng(rand::thread_rng());
        let ephemeral_public = X25519PublicKey(*PublicKey::from(&ephemeral).as_bytes());
        let shared = ephemeral.diffie_hellman(&PublicKey::from(recipient.0));

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = box_cipher(shared.as_bytes(), purpose, binding)
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| PermsError::EncryptionError(e.to_string()))?;

        Ok(Self {
            ephemeral_public,
            nonce,
            ciphertext,
        })
    }

    /// Decrypt with the recipient's secret.
    pub fn open(
        &self,
        recipient: &X25519StaticSecret,
        purpose: &str,
        binding: &[u8],
    ) -> Result<Vec<u8>> {
        let shared = recipient
            .0
            .diffie_hellman(&PublicKey::from(self.ephemeral_public.0));

        box_cipher(shared.as_bytes(), purpose, binding)
            .decrypt(Nonce::from_slice(&self.nonce), self.ciphertext.as_slice())
            .map_err(|_| {
                PermsError::DecryptionError("sealed box did not authenticate".to_string())
            })
    }

    /// Blake3 digest over every field.
    pub fn digest(&self, domain: &str) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_derive_key(domain);
        hasher.update(self.ephemeral_public.as_bytes());
        hasher.update(&self.nonce);
        hasher.update(&self.ciphertext);
        *hasher.finalize().as_bytes()
    }
}

fn box_cipher(shared: &[u8; 32], purpose: &str, binding: &[u8]) -> ChaCha20Poly1305 {
    let mut hasher = blake3::Hasher::new_derive_key("sealdoc-perms-v1-sealed-box");
    hasher.update(purpose.as_bytes());
    hasher.update(shared);
    hasher.update(binding);
    ChaCha20Poly1305::new(Key::from_slice(hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_seal_open() {
        let recipient = X25519StaticSecret::generate();
        let sealed = SealedBox::seal(&recipient.public_key(), "test", b"ctx", b"secret").unwrap();

        assert_eq!(sealed.open(&recipient, "test", b"ctx").unwrap(), b"secret");
        assert_eq!(sealed.ciphertext.len(), b"secret".len() + 16);
    }

    #[test]
    fn test_bound_to_purpose_and_binding() {
        let recipient = X25519StaticSecret::generate();
        let sealed =
            SealedBox::seal(&recipient.public_key(), "input", b"ctx-a", b"secret").unwrap();

        assert!(sealed.open(&recipient, "input", b"ctx-b").is_err());
        assert!(sealed.open(&recipient, "disclosure", b"ctx-a").is_err());
    }

    #[test]
    fn test_other_recipient_cannot_open() {
        let recipient = X25519StaticSecret::generate();
        let sealed = SealedBox::seal(&recipient.public_key(), "p", b"", b"secret").unwrap();

        let other = X25519StaticSecret::generate();
        assert!(matches!(
            sealed.open(&other, "p", b""),
            Err(PermsError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_seeded_secret_is_deterministic() {
        let a = X25519StaticSecret::from_bytes([9u8; 32]);
        let b = X25519StaticSecret::from_bytes([9u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
    }

    proptest! {
        #[test]
        fn any_plaintext_survives_sealing(
            plaintext in prop::collection::vec(any::<u8>(), 0..512),
            binding in prop::collection::vec(any::<u8>(), 0..64),
        ) {
            let recipient = X25519StaticSecret::from_bytes([3u8; 32]);
            let sealed =
                SealedBox::seal(&recipient.public_key(), "p", &binding, &plaintext).unwrap();
            prop_assert_eq!(sealed.open(&recipient, "p", &binding).unwrap(), plaintext);
        }
    }
}
