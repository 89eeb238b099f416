//! Strong type definitions for sealdoc.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a document in the registry.
///
/// Ids are positive and assigned from a single increasing counter; `0` is
/// never assigned. Ids stay within `i64` range so every store can hold them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// The largest assignable id.
    pub const MAX: Self = Self(i64::MAX as u64);

    /// Create a document id. Returns `None` for `0`.
    pub const fn new(id: u64) -> Option<Self> {
        if id == 0 {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Get the numeric value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The id allocated after this one, or `None` once the id space is used up.
    pub const fn next(&self) -> Option<Self> {
        if self.0 >= Self::MAX.0 {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to a secret held by the confidential-compute engine.
///
/// The registry only ever stores and forwards this value. The secret it
/// refers to is never materialized outside the engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretHandle(pub [u8; 32]);

impl SecretHandle {
    /// Generate a fresh random handle.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretHandle({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Identifies one registry deployment.
///
/// Capability proofs are bound to a context so that an encrypted secret
/// submitted to one registry cannot be replayed into another.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(pub [u8; 32]);

impl ContextId {
    /// Derive a context id from a registry name.
    pub fn derive(name: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key("sealdoc-v1-registry-context");
        hasher.update(name.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", &hex::encode(self.0)[..16])
    }
}

/// Position of a committed transaction in the registry ledger.
///
/// Positions start at 1 and increase by one per committed mutation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LedgerPosition(pub u64);

impl LedgerPosition {
    /// Nothing committed yet.
    pub const ZERO: Self = Self(0);

    /// The position following this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LedgerPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_zero_rejected() {
        assert!(DocumentId::new(0).is_none());
        assert_eq!(DocumentId::new(7).map(|id| id.get()), Some(7));
    }

    #[test]
    fn test_document_id_display() {
        assert_eq!(format!("{}", DocumentId(12)), "#12");
        assert_eq!(DocumentId(12).next(), Some(DocumentId(13)));
    }

    #[test]
    fn test_document_id_space_ends_at_max() {
        assert_eq!(DocumentId(DocumentId::MAX.get() - 1).next(), Some(DocumentId::MAX));
        assert_eq!(DocumentId::MAX.next(), None);
        assert_eq!(DocumentId(u64::MAX).next(), None);
    }

    #[test]
    fn test_context_derivation_is_deterministic() {
        assert_eq!(ContextId::derive("alpha"), ContextId::derive("alpha"));
        assert_ne!(ContextId::derive("alpha"), ContextId::derive("beta"));
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(SecretHandle::generate(), SecretHandle::generate());
    }

    #[test]
    fn test_ledger_position_order() {
        assert!(LedgerPosition::ZERO < LedgerPosition::ZERO.next());
        assert_eq!(format!("{}", LedgerPosition(3)), "@3");
    }
}
