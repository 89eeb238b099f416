//! Store trait: the abstract interface for registry persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use sealdoc_core::{
    DocumentId, DocumentRecord, LedgerEntry, LedgerPosition, Principal, RegistryEvent,
    SecretHandle,
};

use crate::error::Result;

/// Position and time of the most recent commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerHead {
    /// `LedgerPosition::ZERO` if nothing was ever committed.
    pub position: LedgerPosition,
    /// Ledger time of the head commit.
    pub timestamp: Option<i64>,
}

/// One atomic registry mutation.
///
/// Permission checks happen before a commit is built; the store only
/// enforces structural rules (the target document exists).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commit {
    /// Insert a new record and append it to the owner's index.
    ///
    /// The id is the successor of the last assigned id, or `first_id` when
    /// no document exists yet.
    CreateDocument {
        first_id: DocumentId,
        owner: Principal,
        name: String,
        body: String,
        secret_handle: SecretHandle,
        timestamp: i64,
    },

    /// Replace a body, advancing `updated_at` and `last_mutation`.
    UpdateBody {
        document_id: DocumentId,
        editor: Principal,
        body: String,
        timestamp: i64,
    },

    /// Record a share. The share index gains the id only if the pair is new.
    GrantAccess {
        document_id: DocumentId,
        grantee: Principal,
        timestamp: i64,
    },
}

impl Commit {
    /// Ledger time of this commit.
    pub fn timestamp(&self) -> i64 {
        match self {
            Commit::CreateDocument { timestamp, .. }
            | Commit::UpdateBody { timestamp, .. }
            | Commit::GrantAccess { timestamp, .. } => *timestamp,
        }
    }

    /// The notification this commit emits once its document id is known.
    pub fn event(&self, document_id: DocumentId) -> RegistryEvent {
        match self {
            Commit::CreateDocument { owner, name, .. } => RegistryEvent::DocumentCreated {
                document_id,
                owner: *owner,
                name: name.clone(),
            },
            Commit::UpdateBody { editor, body, .. } => RegistryEvent::DocumentUpdated {
                document_id,
                editor: *editor,
                new_body: body.clone(),
            },
            Commit::GrantAccess { grantee, .. } => RegistryEvent::AccessGranted {
                document_id,
                grantee: *grantee,
            },
        }
    }
}

/// The Store trait: async interface for registry persistence.
///
/// # Design Notes
///
/// - **Atomic commits**: `commit` applies every effect of a [`Commit`] and
///   appends its ledger entry, or applies nothing.
/// - **Append-only indexes**: owner and share indexes keep insertion order
///   and never shrink. A document appears at most once per principal in
///   the share index.
/// - **No deletes**: records are never removed.
#[async_trait]
pub trait Store: Send + Sync {
    /// Apply a mutation and return the ledger entry it produced.
    async fn commit(&self, commit: Commit) -> Result<LedgerEntry>;

    /// Get a record by id.
    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>>;

    /// Ids created by `owner`, in creation order.
    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>>;

    /// Ids shared with `principal`, in first-grant order.
    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>>;

    /// The most recently assigned document id.
    async fn last_document_id(&self) -> Result<Option<DocumentId>>;

    /// Number of documents ever created.
    async fn document_count(&self) -> Result<u64>;

    /// The last committed ledger position and time.
    async fn head(&self) -> Result<LedgerHead>;

    /// Ledger entries with position greater than `after`, in order.
    async fn entries_since(&self, after: LedgerPosition) -> Result<Vec<LedgerEntry>>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn commit(&self, commit: Commit) -> Result<LedgerEntry> {
        (**self).commit(commit).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        (**self).get_document(id).await
    }

    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>> {
        (**self).owned_document_ids(owner).await
    }

    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>> {
        (**self).shared_document_ids(principal).await
    }

    async fn last_document_id(&self) -> Result<Option<DocumentId>> {
        (**self).last_document_id().await
    }

    async fn document_count(&self) -> Result<u64> {
        (**self).document_count().await
    }

    async fn head(&self) -> Result<LedgerHead> {
        (**self).head().await
    }

    async fn entries_since(&self, after: LedgerPosition) -> Result<Vec<LedgerEntry>> {
        (**self).entries_since(after).await
    }
}
