//! Body encryption with a secret-derived key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;

use crate::error::{EnvelopeError, Result};

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

const TAG_LEN: usize = 16;

/// A ChaCha20-Poly1305 key derived from a document secret.
///
/// Can only encrypt and decrypt; the raw bytes are not exposed.
#[derive(Clone)]
pub struct SymmetricKey(ChaCha20Poly1305);

impl SymmetricKey {
    /// Derive the key for a secret.
    ///
    /// The secret is lowercased and then hashed with Blake3. The same secret
    /// always yields the same key, whatever its letter case.
    pub fn derive(secret: &str) -> Self {
        let canonical = secret.to_lowercase();
        let digest = blake3::hash(canonical.as_bytes());
        Self(ChaCha20Poly1305::new(Key::from_slice(digest.as_bytes())))
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Encrypt `plaintext` under the key derived from `secret`.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }
    encrypt_with_key(plaintext, &SymmetricKey::derive(secret))
}

/// Decrypt `payload` under the key derived from `secret`.
pub fn decrypt(payload: &str, secret: &str) -> Result<String> {
    if payload.is_empty() {
        return Ok(String::new());
    }
    decrypt_with_key(payload, &SymmetricKey::derive(secret))
}

/// Encrypt with an already derived key. A fresh nonce is drawn every call.
pub fn encrypt_with_key(plaintext: &str, key: &SymmetricKey) -> Result<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = key
        .0
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| EnvelopeError::EncryptionError(e.to_string()))?;

    let mut packed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(packed))
}

/// Decrypt with an already derived key.
pub fn decrypt_with_key(payload: &str, key: &SymmetricKey) -> Result<String> {
    if payload.is_empty() {
        return Ok(String::new());
    }

    let packed = STANDARD
        .decode(payload)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;
    if packed.len() < NONCE_LEN + TAG_LEN {
        return Err(EnvelopeError::DecryptionFailed);
    }

    let (nonce, ciphertext) = packed.split_at(NONCE_LEN);
    let plaintext = key
        .0
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EnvelopeError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| EnvelopeError::DecryptionFailed)
}
