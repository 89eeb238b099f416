//! The document registry.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use sealdoc_core::{
    ContextId, DocumentId, DocumentRecord, LedgerClock, LedgerEntry, LedgerPosition, Principal,
    SecretHandle, SystemTimeSource, TimeSource,
};
use sealdoc_perms::{ConfidentialEngine, ConfidentialKeyGateway, PermsError};
use sealdoc_store::{Commit, LedgerHead, Store, StoreError};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};

/// Authoritative store of document metadata.
///
/// # Transactions
///
/// Mutations run one at a time behind the sequencer, which also owns the
/// ledger clock. Inside a transaction the order is fixed: validation and
/// permission checks, then engine grants, then a single store commit.
/// Engine grants are additive and idempotent, so a transaction rejected at
/// the commit step is safe to resubmit. Notifications are broadcast while
/// the sequencer is still held, so subscribers see ledger order.
pub struct DocumentRegistry<S: Store, E: ConfidentialEngine> {
    store: S,
    gateway: ConfidentialKeyGateway<E>,
    first_document_id: DocumentId,
    sequencer: Mutex<LedgerClock>,
    events: broadcast::Sender<LedgerEntry>,
}

impl<S: Store, E: ConfidentialEngine> DocumentRegistry<S, E> {
    /// Open a registry over `store`, using system time.
    pub async fn open(store: S, engine: Arc<E>, config: RegistryConfig) -> Result<Self> {
        Self::open_with_time_source(store, engine, config, Arc::new(SystemTimeSource)).await
    }

    /// Open a registry with an explicit time source.
    ///
    /// The ledger clock resumes after the store's head, so a reopened
    /// registry keeps timestamps strictly increasing.
    pub async fn open_with_time_source(
        store: S,
        engine: Arc<E>,
        config: RegistryConfig,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let first_document_id = config.validate()?;
        let head = store.head().await?;

        let mut clock = LedgerClock::new(time);
        if let Some(last) = head.timestamp {
            clock = clock.resume_after(last);
        }

        let (events, _) = broadcast::channel(config.event_capacity);
        let gateway = ConfidentialKeyGateway::new(engine, config.context());

        info!(
            context = %config.context_name,
            head = %head.position,
            "document registry opened"
        );

        Ok(Self {
            store,
            gateway,
            first_document_id,
            sequencer: Mutex::new(clock),
            events,
        })
    }

    /// The principal this registry holds custody of secrets as.
    pub fn custodian(&self) -> &Principal {
        self.gateway.custodian()
    }

    /// The context capability proofs must be bound to.
    pub fn context(&self) -> &ContextId {
        self.gateway.context()
    }

    /// The gateway in front of the engine.
    pub fn gateway(&self) -> &ConfidentialKeyGateway<E> {
        &self.gateway
    }

    /// The storage backend.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a document owned by `creator`.
    ///
    /// Imports the submitted secret, grants it to the registry and the
    /// creator, then inserts the record and appends it to the creator's
    /// owner index.
    pub async fn create_document(
        &self,
        name: &str,
        initial_body: &str,
        external_ciphertext: &[u8],
        capability_proof: &[u8],
        creator: &Principal,
    ) -> Result<DocumentId> {
        if name.is_empty() {
            return Err(RegistryError::NameRequired);
        }

        let mut clock = self.sequencer.lock().await;
        self.require_free_id().await?;

        let handle = self
            .gateway
            .import_secret(external_ciphertext, capability_proof, creator)
            .await?;
        self.gateway.grant_self_and_registry(&handle, creator).await?;

        let entry = self
            .store
            .commit(Commit::CreateDocument {
                first_id: self.first_document_id,
                owner: *creator,
                name: name.to_string(),
                body: initial_body.to_string(),
                secret_handle: handle,
                timestamp: clock.tick(),
            })
            .await?;

        let id = entry.event.document_id();
        info!(document = %id, owner = %creator, %name, "document created");
        self.publish(entry);
        Ok(id)
    }

    /// Replace a document's body.
    ///
    /// Any principal the engine permits on the document's secret may edit.
    /// The new body is not compared with the old one.
    pub async fn update_document_body(
        &self,
        id: DocumentId,
        new_body: &str,
        caller: &Principal,
    ) -> Result<()> {
        let mut clock = self.sequencer.lock().await;

        let record = self.require_document(id).await?;
        self.require_permission(&record.secret_handle, id, caller)
            .await?;

        let entry = self
            .store
            .commit(Commit::UpdateBody {
                document_id: id,
                editor: *caller,
                body: new_body.to_string(),
                timestamp: clock.tick(),
            })
            .await?;

        debug!(document = %id, editor = %caller, position = %entry.position, "body updated");
        self.publish(entry);
        Ok(())
    }

    /// Share a document with `grantee`.
    ///
    /// The engine grant is repeated on every call; the share index only
    /// gains the document the first time.
    pub async fn grant_access(
        &self,
        id: DocumentId,
        grantee: &Principal,
        caller: &Principal,
    ) -> Result<()> {
        if grantee.is_null() {
            return Err(RegistryError::InvalidGrantee);
        }

        let mut clock = self.sequencer.lock().await;

        let record = self.require_document(id).await?;
        self.require_permission(&record.secret_handle, id, caller)
            .await?;
        self.gateway
            .grant_principal(&record.secret_handle, grantee)
            .await?;

        let entry = self
            .store
            .commit(Commit::GrantAccess {
                document_id: id,
                grantee: *grantee,
                timestamp: clock.tick(),
            })
            .await?;

        info!(document = %id, %grantee, granted_by = %caller, "access granted");
        self.publish(entry);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a record. No permission check: records hold only ciphertext.
    pub async fn get_document(&self, id: DocumentId) -> Result<DocumentRecord> {
        self.store
            .get_document(id)
            .await?
            .ok_or(RegistryError::NotFound(id))
    }

    /// Ids created by `owner`, in creation order.
    pub async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>> {
        Ok(self.store.owned_document_ids(owner).await?)
    }

    /// Ids shared with `principal`, in first-grant order.
    pub async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>> {
        Ok(self.store.shared_document_ids(principal).await?)
    }

    /// Whether `id` has been assigned.
    pub async fn document_exists(&self, id: DocumentId) -> Result<bool> {
        let last = self.store.last_document_id().await?;
        Ok(id >= self.first_document_id && last.is_some_and(|last| id <= last))
    }

    /// Number of documents ever created.
    pub async fn total_documents(&self) -> Result<u64> {
        Ok(self.store.document_count().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────

    /// Receive every notification committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEntry> {
        self.events.subscribe()
    }

    /// Committed notifications after `position`, for replay.
    pub async fn entries_since(&self, position: LedgerPosition) -> Result<Vec<LedgerEntry>> {
        Ok(self.store.entries_since(position).await?)
    }

    /// Position and time of the last committed mutation.
    pub async fn head(&self) -> Result<LedgerHead> {
        Ok(self.store.head().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    async fn require_document(&self, id: DocumentId) -> Result<DocumentRecord> {
        self.get_document(id).await
    }

    /// Fail before the engine takes custody of a secret that no id is left for.
    async fn require_free_id(&self) -> Result<()> {
        match self.store.last_document_id().await? {
            Some(last) if last.next().is_none() => {
                warn!(%last, "document id space exhausted");
                Err(StoreError::IdSpaceExhausted(last).into())
            }
            _ => Ok(()),
        }
    }

    async fn require_permission(
        &self,
        handle: &SecretHandle,
        id: DocumentId,
        caller: &Principal,
    ) -> Result<()> {
        match self.gateway.require_caller_permission(handle, caller).await {
            Ok(()) => Ok(()),
            Err(PermsError::Unauthorized { .. }) => {
                warn!(document = %id, %caller, "caller not permitted");
                Err(RegistryError::Unauthorized {
                    caller: *caller,
                    document: id,
                })
            }
            Err(other) => Err(other.into()),
        }
    }

    fn publish(&self, entry: LedgerEntry) {
        // No subscribers is fine; the entry is already in the store's log.
        let _ = self.events.send(entry);
    }
}
