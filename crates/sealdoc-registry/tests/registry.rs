//! Integration tests for the document registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use proptest::prelude::*;

use sealdoc_core::{
    DocumentId, DocumentRecord, Keypair, LedgerEntry, LedgerPosition, Principal, RegistryEvent,
};
use sealdoc_perms::{ConfidentialEngine, InputEncryptor, MemoryEngine, SecretValue};
use sealdoc_registry::{DocumentRegistry, RegistryConfig, RegistryError};
use sealdoc_store::{Commit, LedgerHead, MemoryStore, SqliteStore, Store, StoreError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

async fn memory_registry() -> Result<DocumentRegistry<MemoryStore, MemoryEngine>> {
    init_tracing();
    Ok(DocumentRegistry::open(
        MemoryStore::new(),
        Arc::new(MemoryEngine::new()),
        RegistryConfig::default(),
    )
    .await?)
}

/// Build the opaque submission a client would send for a fresh secret.
fn submission<S: Store>(
    registry: &DocumentRegistry<S, MemoryEngine>,
    submitter: &Keypair,
) -> (Vec<u8>, Vec<u8>) {
    let input = InputEncryptor::new(
        registry.gateway().engine().input_public_key(),
        *registry.context(),
    )
    .encrypt(&SecretValue::generate(), submitter)
    .expect("encrypt submission");
    (input.ciphertext.to_vec(), input.proof.to_vec())
}

async fn create<S: Store>(
    registry: &DocumentRegistry<S, MemoryEngine>,
    owner: &Keypair,
    name: &str,
    body: &str,
) -> std::result::Result<DocumentId, RegistryError> {
    let (ciphertext, proof) = submission(registry, owner);
    registry
        .create_document(name, body, &ciphertext, &proof, &owner.public_key())
        .await
}

#[tokio::test]
async fn genesis_scenario() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();

    let id = create(&registry, &alice, "Genesis", "").await?;
    let record = registry.get_document(id).await?;

    assert_eq!(record.owner, alice.public_key());
    assert_eq!(record.name, "Genesis");
    assert_eq!(record.body, "");
    assert_eq!(record.created_at, record.updated_at);
    Ok(())
}

#[tokio::test]
async fn grant_then_update_scenario() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let bob = Keypair::generate().public_key();
    let id = create(&registry, &alice, "Genesis", "").await?;
    let before = registry.get_document(id).await?;

    let denied = registry.update_document_body(id, "ciphertextX", &bob).await;
    assert!(matches!(
        denied,
        Err(RegistryError::Unauthorized { caller, document }) if caller == bob && document == id
    ));

    registry.grant_access(id, &bob, &alice.public_key()).await?;
    registry.update_document_body(id, "ciphertextX", &bob).await?;

    let after = registry.get_document(id).await?;
    assert_eq!(after.body, "ciphertextX");
    assert!(after.updated_at > before.updated_at);
    assert!(after.last_mutation > before.last_mutation);
    assert_eq!(registry.shared_document_ids(&bob).await?, vec![id]);
    Ok(())
}

#[tokio::test]
async fn empty_name_rejected_without_effect() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();

    let result = create(&registry, &alice, "", "body").await;
    assert!(matches!(result, Err(RegistryError::NameRequired)));
    assert_eq!(registry.total_documents().await?, 0);
    assert_eq!(registry.gateway().engine().secret_count()?, 0);
    assert!(registry.entries_since(LedgerPosition::ZERO).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_creation_consumes_no_id() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let mallory = Keypair::generate();

    let first = create(&registry, &alice, "one", "").await?;

    // Alice's submission claimed by Mallory.
    let (ciphertext, proof) = submission(&registry, &alice);
    let stolen = registry
        .create_document("two", "", &ciphertext, &proof, &mallory.public_key())
        .await;
    assert!(matches!(stolen, Err(RegistryError::ProofInvalid(_))));

    let second = create(&registry, &alice, "three", "").await?;
    assert_eq!(Some(second), first.next());
    assert_eq!(registry.total_documents().await?, 2);
    assert!(registry.owned_document_ids(&mallory.public_key()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn proof_for_other_registry_rejected() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let input = InputEncryptor::new(
        registry.gateway().engine().input_public_key(),
        RegistryConfig {
            context_name: "elsewhere".to_string(),
            ..Default::default()
        }
        .context(),
    )
    .encrypt(&SecretValue::generate(), &alice)?;

    let result = registry
        .create_document("doc", "", &input.ciphertext, &input.proof, &alice.public_key())
        .await;
    assert!(matches!(result, Err(RegistryError::ProofInvalid(_))));
    Ok(())
}

#[tokio::test]
async fn owned_index_appends_in_creation_order() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let bob = Keypair::generate();

    let a1 = create(&registry, &alice, "a1", "").await?;
    let b1 = create(&registry, &bob, "b1", "").await?;
    let a2 = create(&registry, &alice, "a2", "").await?;

    assert_eq!(registry.owned_document_ids(&alice.public_key()).await?, vec![a1, a2]);
    assert_eq!(registry.owned_document_ids(&bob.public_key()).await?, vec![b1]);
    Ok(())
}

#[tokio::test]
async fn double_grant_indexes_once_and_still_notifies() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let bob = Keypair::generate().public_key();
    let id = create(&registry, &alice, "doc", "").await?;

    registry.grant_access(id, &bob, &alice.public_key()).await?;
    registry.grant_access(id, &bob, &alice.public_key()).await?;

    assert_eq!(registry.shared_document_ids(&bob).await?, vec![id]);
    let grants = registry
        .entries_since(LedgerPosition::ZERO)
        .await?
        .into_iter()
        .filter(|entry| matches!(entry.event, RegistryEvent::AccessGranted { .. }))
        .count();
    assert_eq!(grants, 2);
    Ok(())
}

#[tokio::test]
async fn null_grantee_rejected_without_effect() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let id = create(&registry, &alice, "doc", "").await?;
    let head = registry.head().await?;

    let result = registry
        .grant_access(id, &Principal::NULL, &alice.public_key())
        .await;

    assert!(matches!(result, Err(RegistryError::InvalidGrantee)));
    assert_eq!(registry.head().await?, head);
    assert!(registry.shared_document_ids(&Principal::NULL).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_document_is_not_found() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate().public_key();
    let bob = Keypair::generate().public_key();
    let missing = DocumentId(42);

    assert!(matches!(
        registry.get_document(missing).await,
        Err(RegistryError::NotFound(id)) if id == missing
    ));
    assert!(matches!(
        registry.update_document_body(missing, "x", &alice).await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        registry.grant_access(missing, &bob, &alice).await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(!registry.document_exists(missing).await?);
    Ok(())
}

#[tokio::test]
async fn first_id_beyond_id_space_rejected() -> Result<()> {
    let result = DocumentRegistry::open(
        MemoryStore::new(),
        Arc::new(MemoryEngine::new()),
        RegistryConfig {
            first_document_id: u64::MAX,
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(RegistryError::InvalidConfig(_))));
    Ok(())
}

#[tokio::test]
async fn exhausted_id_space_rejects_creation_cleanly() -> Result<()> {
    init_tracing();
    let registry = DocumentRegistry::open(
        MemoryStore::new(),
        Arc::new(MemoryEngine::new()),
        RegistryConfig {
            first_document_id: DocumentId::MAX.get(),
            ..Default::default()
        },
    )
    .await?;
    let alice = Keypair::generate();

    let last = create(&registry, &alice, "last", "").await?;
    assert_eq!(last, DocumentId::MAX);

    let result = create(&registry, &alice, "overflow", "").await;
    assert!(matches!(
        result,
        Err(RegistryError::Store(StoreError::IdSpaceExhausted(DocumentId::MAX)))
    ));

    // No secret imported for the rejected document, and the registry keeps working.
    assert_eq!(registry.gateway().engine().secret_count()?, 1);
    assert_eq!(registry.total_documents().await?, 1);
    assert_eq!(registry.owned_document_ids(&alice.public_key()).await?, vec![last]);
    registry
        .update_document_body(last, "still writable", &alice.public_key())
        .await?;
    Ok(())
}

/// Memory store whose commits can be switched off.
#[derive(Default)]
struct RefusingStore {
    inner: MemoryStore,
    refuse: AtomicBool,
}

#[async_trait]
impl Store for RefusingStore {
    async fn commit(&self, commit: Commit) -> sealdoc_store::Result<LedgerEntry> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(StoreError::Background("disk unavailable".to_string()));
        }
        self.inner.commit(commit).await
    }

    async fn get_document(
        &self,
        id: DocumentId,
    ) -> sealdoc_store::Result<Option<DocumentRecord>> {
        self.inner.get_document(id).await
    }

    async fn owned_document_ids(
        &self,
        owner: &Principal,
    ) -> sealdoc_store::Result<Vec<DocumentId>> {
        self.inner.owned_document_ids(owner).await
    }

    async fn shared_document_ids(
        &self,
        principal: &Principal,
    ) -> sealdoc_store::Result<Vec<DocumentId>> {
        self.inner.shared_document_ids(principal).await
    }

    async fn last_document_id(&self) -> sealdoc_store::Result<Option<DocumentId>> {
        self.inner.last_document_id().await
    }

    async fn document_count(&self) -> sealdoc_store::Result<u64> {
        self.inner.document_count().await
    }

    async fn head(&self) -> sealdoc_store::Result<LedgerHead> {
        self.inner.head().await
    }

    async fn entries_since(
        &self,
        after: LedgerPosition,
    ) -> sealdoc_store::Result<Vec<LedgerEntry>> {
        self.inner.entries_since(after).await
    }
}

#[tokio::test]
async fn grant_rejected_at_commit_is_reconciled_on_resubmit() -> Result<()> {
    init_tracing();
    let registry = DocumentRegistry::open(
        RefusingStore::default(),
        Arc::new(MemoryEngine::new()),
        RegistryConfig::default(),
    )
    .await?;
    let alice = Keypair::generate();
    let bob = Keypair::generate().public_key();
    let id = create(&registry, &alice, "doc", "").await?;
    let handle = registry.get_document(id).await?.secret_handle;
    let head = registry.head().await?;
    let mut events = registry.subscribe();

    registry.store().refuse.store(true, Ordering::SeqCst);
    let result = registry.grant_access(id, &bob, &alice.public_key()).await;

    assert!(matches!(
        result,
        Err(RegistryError::Store(StoreError::Background(_)))
    ));
    assert!(registry.shared_document_ids(&bob).await?.is_empty());
    assert_eq!(registry.head().await?, head);
    assert!(events.try_recv().is_err());
    // Engine grants are additive: the permission outlives the failed commit.
    assert!(registry.gateway().engine().is_allowed(&handle, &bob).await?);

    registry.store().refuse.store(false, Ordering::SeqCst);
    registry.grant_access(id, &bob, &alice.public_key()).await?;

    assert_eq!(registry.shared_document_ids(&bob).await?, vec![id]);
    assert_eq!(
        events.recv().await?.event,
        RegistryEvent::AccessGranted {
            document_id: id,
            grantee: bob
        }
    );
    Ok(())
}

#[tokio::test]
async fn unauthorized_grant_leaves_engine_untouched() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let mallory = Keypair::generate().public_key();
    let id = create(&registry, &alice, "doc", "").await?;
    let handle = registry.get_document(id).await?.secret_handle;

    let result = registry.grant_access(id, &mallory, &mallory).await;

    assert!(matches!(result, Err(RegistryError::Unauthorized { .. })));
    assert!(!registry.gateway().engine().is_allowed(&handle, &mallory).await?);
    assert!(registry.shared_document_ids(&mallory).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn identical_body_update_still_notifies() -> Result<()> {
    let registry = memory_registry().await?;
    let alice = Keypair::generate();
    let id = create(&registry, &alice, "doc", "same").await?;
    let mut events = registry.subscribe();

    registry
        .update_document_body(id, "same", &alice.public_key())
        .await?;

    let entry = events.recv().await?;
    assert!(matches!(entry.event, RegistryEvent::DocumentUpdated { .. }));
    Ok(())
}

#[tokio::test]
async fn sqlite_registry_survives_reopen() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("registry.db");
    let engine = Arc::new(MemoryEngine::new());
    let alice = Keypair::generate();
    let bob = Keypair::generate().public_key();

    let (first, first_updated) = {
        let registry =
            DocumentRegistry::open(SqliteStore::open(&path)?, engine.clone(), Default::default())
                .await?;
        let id = create(&registry, &alice, "persisted", "").await?;
        registry.grant_access(id, &bob, &alice.public_key()).await?;
        (id, registry.get_document(id).await?.updated_at)
    };

    let registry =
        DocumentRegistry::open(SqliteStore::open(&path)?, engine, Default::default()).await?;

    assert_eq!(registry.get_document(first).await?.name, "persisted");
    assert_eq!(registry.shared_document_ids(&bob).await?, vec![first]);

    let second = create(&registry, &alice, "after reopen", "").await?;
    assert_eq!(Some(second), first.next());

    registry.update_document_body(first, "edited", &bob).await?;
    assert!(registry.get_document(first).await?.updated_at > first_updated);
    assert_eq!(registry.head().await?.position, LedgerPosition(4));
    Ok(())
}

#[tokio::test]
async fn concurrent_creations_get_distinct_ids() -> Result<()> {
    let registry = Arc::new(memory_registry().await?);
    let mut tasks = Vec::new();

    for i in 0..16 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            let owner = Keypair::generate();
            create(&*registry, &owner, &format!("doc-{i}"), "").await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await??);
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 16);
    assert_eq!(ids.first(), Some(&DocumentId(1)));
    assert_eq!(ids.last(), Some(&DocumentId(16)));
    Ok(())
}

#[derive(Debug, Clone)]
enum Attempt {
    Valid,
    EmptyName,
    WrongSubmitter,
}

fn attempt() -> impl Strategy<Value = Attempt> {
    prop_oneof![
        3 => Just(Attempt::Valid),
        1 => Just(Attempt::EmptyName),
        1 => Just(Attempt::WrongSubmitter),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ids_strictly_increase_across_failures(attempts in prop::collection::vec(attempt(), 1..24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let registry = memory_registry().await.unwrap();
            let owner = Keypair::generate();
            let other = Keypair::generate();
            let mut last: Option<DocumentId> = None;
            let mut created = 0u64;

            for attempt in &attempts {
                let (ciphertext, proof) = submission(&registry, &owner);
                let (name, submitter) = match attempt {
                    Attempt::Valid => ("doc", owner.public_key()),
                    Attempt::EmptyName => ("", owner.public_key()),
                    Attempt::WrongSubmitter => ("doc", other.public_key()),
                };

                match registry
                    .create_document(name, "", &ciphertext, &proof, &submitter)
                    .await
                {
                    Ok(id) => {
                        let expected =
                            last.map_or(Some(DocumentId(1)), |l| l.next()).unwrap();
                        assert_eq!(id, expected);
                        last = Some(id);
                        created += 1;
                    }
                    Err(RegistryError::NameRequired) => {
                        assert!(matches!(attempt, Attempt::EmptyName));
                    }
                    Err(RegistryError::ProofInvalid(_)) => {
                        assert!(matches!(attempt, Attempt::WrongSubmitter));
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }

            assert_eq!(registry.total_documents().await.unwrap(), created);
            assert_eq!(
                registry.owned_document_ids(&owner.public_key()).await.unwrap().len() as u64,
                created
            );
        });
    }
}
