//! Principals and their signing keys.
//!
//! A [`Principal`] is the 32-byte Ed25519 verifying key of a [`Keypair`].
//! Capability proofs and disclosure requests are authenticated by checking
//! a [`Signature`] against the principal that claims to have made it.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::types::ContextId;

/// An identity capable of owning or being granted a document.
///
/// The all-zero value is the null principal. It can never own a document or
/// receive a grant, and no signature verifies against it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(pub [u8; 32]);

impl Principal {
    pub const NULL: Self = Self([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// The principal a registry acts as while it holds custody of secrets.
    ///
    /// Derived rather than generated, so every registry opened on the same
    /// context resolves to the same custodian.
    pub fn custodian(context: &ContextId) -> Self {
        Self(blake3::derive_key(
            "sealdoc-v1-registry-custodian",
            context.as_bytes(),
        ))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Check that `signature` over `message` was made by this principal.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|_| CoreError::InvalidPublicKey)?
            .verify(message, &ed25519_dalek::Signature::from_bytes(&signature.0))
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl FromStr for Principal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({self})")
    }
}

/// Short form: the first eight bytes in hex.
impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Parse opaque bytes; anything but exactly 64 bytes is rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        <[u8; 64]>::try_from(bytes)
            .map(Self)
            .map_err(|_| CoreError::DecodingError(format!("signature length {}", bytes.len())))
    }

    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

/// The signing half of a principal.
#[derive(Clone)]
pub struct Keypair(SigningKey);

impl Keypair {
    pub fn generate() -> Self {
        Self(SigningKey::generate(&mut rand::thread_rng()))
    }

    /// Deterministic keys from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(seed))
    }

    /// The principal this keypair speaks for.
    pub fn public_key(&self) -> Principal {
        Principal(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_binds_message_and_signer() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"grant");

        keypair.public_key().verify(b"grant", &signature).unwrap();
        assert!(keypair.public_key().verify(b"grand", &signature).is_err());
        assert!(Keypair::generate()
            .public_key()
            .verify(b"grant", &signature)
            .is_err());
    }

    #[test]
    fn test_seeded_keypairs_agree() {
        let seed = [0x42; 32];
        assert_eq!(
            Keypair::from_seed(&seed).public_key(),
            Keypair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn test_null_principal_verifies_nothing() {
        assert!(Principal::NULL.is_null());
        assert!(!Keypair::generate().public_key().is_null());

        let signature = Keypair::generate().sign(b"msg");
        assert!(Principal::NULL.verify(b"msg", &signature).is_err());
    }

    #[test]
    fn test_custodian_depends_on_context() {
        let a = Principal::custodian(&ContextId::derive("registry-a"));
        let b = Principal::custodian(&ContextId::derive("registry-b"));
        assert_ne!(a, b);
        assert_eq!(a, Principal::custodian(&ContextId::derive("registry-a")));
        assert!(!a.is_null());
    }

    #[test]
    fn test_principal_parses_from_hex() {
        let principal = Keypair::generate().public_key();
        assert_eq!(principal.to_hex().parse::<Principal>().unwrap(), principal);
        assert!("abcd".parse::<Principal>().is_err());
        assert_eq!(principal.to_string().len(), 16);
    }

    #[test]
    fn test_signature_length_is_checked() {
        assert!(Signature::from_slice(&[0u8; 63]).is_err());
        assert!(Signature::from_slice(&[0u8; 64]).is_ok());
    }
}
