//! Ledger transport abstraction.
//!
//! The client never talks to a registry directly. It submits operations
//! through a [`Ledger`], which could be an in-process registry or a remote
//! node that signs, submits and waits for confirmation.

use std::sync::Arc;

use async_trait::async_trait;

use sealdoc_core::{ContextId, DocumentId, DocumentRecord, Principal};
use sealdoc_perms::ConfidentialEngine;
use sealdoc_registry::{DocumentRegistry, Result};
use sealdoc_store::Store;

/// The registry's operation surface, with an explicit caller.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The context capability proofs must be bound to.
    fn context(&self) -> ContextId;

    /// Create a document owned by `caller`.
    async fn create_document(
        &self,
        name: &str,
        initial_body: &str,
        external_ciphertext: &[u8],
        capability_proof: &[u8],
        caller: &Principal,
    ) -> Result<DocumentId>;

    /// Replace a document's body.
    async fn update_document_body(
        &self,
        id: DocumentId,
        new_body: &str,
        caller: &Principal,
    ) -> Result<()>;

    /// Share a document with `grantee`.
    async fn grant_access(
        &self,
        id: DocumentId,
        grantee: &Principal,
        caller: &Principal,
    ) -> Result<()>;

    /// Get a record.
    async fn get_document(&self, id: DocumentId) -> Result<DocumentRecord>;

    /// Ids created by `owner`.
    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>>;

    /// Ids shared with `principal`.
    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>>;

    /// Whether `id` has been assigned.
    async fn document_exists(&self, id: DocumentId) -> Result<bool>;

    /// Number of documents ever created.
    async fn total_documents(&self) -> Result<u64>;
}

#[async_trait]
impl<S, E> Ledger for DocumentRegistry<S, E>
where
    S: Store,
    E: ConfidentialEngine,
{
    fn context(&self) -> ContextId {
        *DocumentRegistry::context(self)
    }

    async fn create_document(
        &self,
        name: &str,
        initial_body: &str,
        external_ciphertext: &[u8],
        capability_proof: &[u8],
        caller: &Principal,
    ) -> Result<DocumentId> {
        DocumentRegistry::create_document(
            self,
            name,
            initial_body,
            external_ciphertext,
            capability_proof,
            caller,
        )
        .await
    }

    async fn update_document_body(
        &self,
        id: DocumentId,
        new_body: &str,
        caller: &Principal,
    ) -> Result<()> {
        DocumentRegistry::update_document_body(self, id, new_body, caller).await
    }

    async fn grant_access(
        &self,
        id: DocumentId,
        grantee: &Principal,
        caller: &Principal,
    ) -> Result<()> {
        DocumentRegistry::grant_access(self, id, grantee, caller).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<DocumentRecord> {
        DocumentRegistry::get_document(self, id).await
    }

    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>> {
        DocumentRegistry::owned_document_ids(self, owner).await
    }

    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>> {
        DocumentRegistry::shared_document_ids(self, principal).await
    }

    async fn document_exists(&self, id: DocumentId) -> Result<bool> {
        DocumentRegistry::document_exists(self, id).await
    }

    async fn total_documents(&self) -> Result<u64> {
        DocumentRegistry::total_documents(self).await
    }
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn context(&self) -> ContextId {
        (**self).context()
    }

    async fn create_document(
        &self,
        name: &str,
        initial_body: &str,
        external_ciphertext: &[u8],
        capability_proof: &[u8],
        caller: &Principal,
    ) -> Result<DocumentId> {
        (**self)
            .create_document(name, initial_body, external_ciphertext, capability_proof, caller)
            .await
    }

    async fn update_document_body(
        &self,
        id: DocumentId,
        new_body: &str,
        caller: &Principal,
    ) -> Result<()> {
        (**self).update_document_body(id, new_body, caller).await
    }

    async fn grant_access(
        &self,
        id: DocumentId,
        grantee: &Principal,
        caller: &Principal,
    ) -> Result<()> {
        (**self).grant_access(id, grantee, caller).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<DocumentRecord> {
        (**self).get_document(id).await
    }

    async fn owned_document_ids(&self, owner: &Principal) -> Result<Vec<DocumentId>> {
        (**self).owned_document_ids(owner).await
    }

    async fn shared_document_ids(&self, principal: &Principal) -> Result<Vec<DocumentId>> {
        (**self).shared_document_ids(principal).await
    }

    async fn document_exists(&self, id: DocumentId) -> Result<bool> {
        (**self).document_exists(id).await
    }

    async fn total_documents(&self) -> Result<u64> {
        (**self).total_documents().await
    }
}
