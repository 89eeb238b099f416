//! Client identities.

use sealdoc_core::{Keypair, Principal};
use sealdoc_perms::{X25519PublicKey, X25519StaticSecret};

/// A principal's keys.
///
/// The Ed25519 key signs submissions and disclosure requests and is the
/// principal id. The X25519 key receives disclosed secrets.
pub struct Identity {
    signing: Keypair,
    encryption: X25519StaticSecret,
}

impl Identity {
    /// Generate a fresh identity.
    pub fn generate() -> Self {
        Self {
            signing: Keypair::generate(),
            encryption: X25519StaticSecret::generate(),
        }
    }

    /// Derive both keys from one seed.
    ///
    /// The signing key is the same one [`Keypair::from_seed`] gives, so the
    /// principal matches a keypair built from the same seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing: Keypair::from_seed(seed),
            encryption: X25519StaticSecret::from_bytes(blake3::derive_key(
                "sealdoc-v1-identity-encryption",
                seed,
            )),
        }
    }

    /// The principal this identity acts as.
    pub fn principal(&self) -> Principal {
        self.signing.public_key()
    }

    /// The key secrets are disclosed to.
    pub fn encryption_public_key(&self) -> X25519PublicKey {
        self.encryption.public_key()
    }

    pub(crate) fn signing(&self) -> &Keypair {
        &self.signing
    }

    pub(crate) fn encryption(&self) -> &X25519StaticSecret {
        &self.encryption
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("principal", &self.principal())
            .finish_non_exhaustive()
    }
}
