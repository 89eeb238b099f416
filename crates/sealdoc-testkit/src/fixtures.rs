//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use sealdoc_core::{DocumentId, Keypair, ManualTimeSource, Principal};
use sealdoc_perms::{InputEncryptor, MemoryEngine, SecretValue};
use sealdoc_registry::{DocumentRegistry, RegistryConfig, RegistryError, Result};
use sealdoc_store::MemoryStore;

/// Ledger time fixtures start at.
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// A named participant with deterministic keys.
#[derive(Clone)]
pub struct Party {
    pub name: String,
    /// Seed the party's keys are derived from.
    pub seed: [u8; 32],
    pub keypair: Keypair,
}

impl Party {
    /// The party's principal.
    pub fn principal(&self) -> Principal {
        self.keypair.public_key()
    }
}

impl std::fmt::Debug for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Party({}, {})", self.name, self.principal())
    }
}

/// A party whose keys are derived from its name.
pub fn party(name: &str) -> Party {
    let seed = blake3::derive_key("sealdoc-testkit-party", name.as_bytes());
    Party {
        name: name.to_string(),
        seed,
        keypair: Keypair::from_seed(&seed),
    }
}

/// `count` distinct parties named `party-0`, `party-1`, ...
pub fn multi_party(count: usize) -> Vec<Party> {
    (0..count).map(|i| party(&format!("party-{i}"))).collect()
}

/// A registry over a memory store and a memory engine, on a manual clock.
pub struct TestRegistry {
    pub registry: Arc<DocumentRegistry<MemoryStore, MemoryEngine>>,
    pub engine: Arc<MemoryEngine>,
    pub time: Arc<ManualTimeSource>,
}

impl TestRegistry {
    /// A registry with the default configuration.
    pub async fn new() -> Result<Self> {
        Self::with_config(RegistryConfig::default()).await
    }

    /// A registry with a custom configuration.
    pub async fn with_config(config: RegistryConfig) -> Result<Self> {
        let engine = Arc::new(MemoryEngine::new());
        let time = Arc::new(ManualTimeSource::new(START_MILLIS));
        let registry = DocumentRegistry::open_with_time_source(
            MemoryStore::new(),
            engine.clone(),
            config,
            time.clone(),
        )
        .await?;

        Ok(Self {
            registry: Arc::new(registry),
            engine,
            time,
        })
    }

    /// The opaque `(ciphertext, proof)` pair `submitter` would send for
    /// `secret`.
    pub fn submission(
        &self,
        submitter: &Keypair,
        secret: &SecretValue,
    ) -> Result<(Vec<u8>, Vec<u8>)> {
        let input = InputEncryptor::new(self.engine.input_public_key(), *self.registry.context())
            .encrypt(secret, submitter)
            .map_err(RegistryError::from)?;
        Ok((input.ciphertext.to_vec(), input.proof.to_vec()))
    }

    /// Create a document with an empty body and a fresh secret.
    pub async fn create(&self, owner: &Party, name: &str) -> Result<DocumentId> {
        let (ciphertext, proof) = self.submission(&owner.keypair, &SecretValue::generate())?;
        self.registry
            .create_document(name, "", &ciphertext, &proof, &owner.principal())
            .await
    }
}
