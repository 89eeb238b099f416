//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use sealdoc_core::{DocumentId, DocumentRecord, LedgerEntry, LedgerPosition, Principal};

use crate::error::{Result, StoreError};
use crate::traits::{Commit, LedgerHead, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by id.
    documents: BTreeMap<DocumentId, DocumentRecord>,

    /// Owner index, creation order.
    owned: HashMap<Principal, Vec<DocumentId>>,

    /// Share index, first-grant order.
    shared: HashMap<Principal, Vec<DocumentId>>,

    /// Membership set backing the share index.
    share_pairs: HashSet<(DocumentId, Principal)>,

    /// Append-only ledger.
    ledger: Vec<LedgerEntry>,
}

impl MemoryStoreInner {
    fn next_position(&self) -> LedgerPosition {
        self.ledger
            .last()
            .map_or(LedgerPosition::ZERO, |entry| entry.position)
            .next()
    }

    fn apply(&mut self, commit: Commit) -> Result<LedgerEntry> {
        let position = self.next_position();
        let timestamp = commit.timestamp();

        let document_id = match &commit {
            Commit::CreateDocument {
                first_id,
                owner,
                name,
                body,
                secret_handle,
                timestamp,
            } => {
                let id = match self.documents.keys().next_back() {
                    Some(last) => last.next().ok_or(StoreError::IdSpaceExhausted(*last))?,
                    None => *first_id,
                };

                self.documents.insert(
                    id,
                    DocumentRecord {
                        id,
                        owner: *owner,
                        name: name.clone(),
                        body: body.clone(),
                        secret_handle: *secret_handle,
                        created_at: *timestamp,
                        updated_at: *timestamp,
                        last_mutation: position,
                    },
                );
                self.owned.entry(*owner).or_default().push(id);
                id
            }

            Commit::UpdateBody {
                document_id,
                body,
                timestamp,
                ..
            } => {
                let record = self
                    .documents
                    .get_mut(document_id)
                    .ok_or(StoreError::NotFound(*document_id))?;
                record.body = body.clone();
                record.updated_at = *timestamp;
                record.last_mutation = position;
                *document_id
            }

            Commit::GrantAccess {
                document_id,
                grantee,
                ..
            } => {
                if !self.documents.contains_key(document_id) {
                    return Err(StoreError::NotFound(*document_id));
                }
                if self.share_pairs.insert((*document_id, *grantee)) {
                    self.shared.entry(*grantee).or_default().push(*document_id);
                }
                *document_id
            }
        };

        let entry = LedgerEntry {
            position,
            timestamp,
            event: commit.event(document_id),
        };
        self.ledger.push(entry.clone());
        Ok(entry)
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryStoreInner) -> T) -> Result<T> {
        let inner = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&inner))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn commit(&self, commit: Commit) -> Result<LedgerEntry> {
        let mut inner = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        // Every check in `apply` runs before its first write.
        inner.apply(commit)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        self.read(|inner| inner.documents.get(&id).cloned())
    }

    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>> {
        self.read(|inner| inner.owned.get(owner).cloned().unwrap_or_default())
    }

    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>> {
        self.read(|inner| inner.shared.get(principal).cloned().unwrap_or_default())
    }

    async fn last_document_id(&self) -> Result<Option<DocumentId>> {
        self.read(|inner| inner.documents.keys().next_back().copied())
    }

    async fn document_count(&self) -> Result<u64> {
        self.read(|inner| inner.documents.len() as u64)
    }

    async fn head(&self) -> Result<LedgerHead> {
        self.read(|inner| match inner.ledger.last() {
            Some(entry) => LedgerHead {
                position: entry.position,
                timestamp: Some(entry.timestamp),
            },
            None => LedgerHead::default(),
        })
    }

    async fn entries_since(&self, after: LedgerPosition) -> Result<Vec<LedgerEntry>> {
        self.read(|inner| {
            inner
                .ledger
                .iter()
                .filter(|entry| entry.position > after)
                .cloned()
                .collect()
        })
    }
}
