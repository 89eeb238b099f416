//! The client pipeline.
//!
//! A [`DocumentClient`] acts for one [`Identity`]. Every step waits for the
//! previous one and stops at the first failure: a body is never decrypted
//! before its secret has been recovered, and a failed decryption is never
//! replaced with an empty or stale plaintext.

use tracing::{debug, info, warn};

use sealdoc_core::{DocumentId, DocumentRecord, Principal, SecretHandle};
use sealdoc_envelope as envelope;
use sealdoc_perms::{
    DisclosureRequest, DisclosureService, InputEncryptor, SecretValue, X25519PublicKey,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::identity::Identity;
use crate::ledger::Ledger;

/// A decrypted document, ready to edit.
#[derive(Debug)]
pub struct OpenDocument {
    record: DocumentRecord,
    secret: SecretValue,
    plaintext: String,
}

impl OpenDocument {
    /// The document id.
    pub fn id(&self) -> DocumentId {
        self.record.id
    }

    /// The record as last read from the ledger.
    pub fn record(&self) -> &DocumentRecord {
        &self.record
    }

    /// The decrypted body.
    pub fn plaintext(&self) -> &str {
        &self.plaintext
    }
}

/// Drives the document pipeline for one identity.
pub struct DocumentClient<L: Ledger, D: DisclosureService> {
    ledger: L,
    disclosure: D,
    engine_key: X25519PublicKey,
    identity: Identity,
    config: ClientConfig,
}

impl<L: Ledger, D: DisclosureService> DocumentClient<L, D> {
    /// Create a client.
    ///
    /// `engine_key` is the engine's input key that new secrets are sealed to.
    pub fn new(
        ledger: L,
        disclosure: D,
        engine_key: X25519PublicKey,
        identity: Identity,
        config: ClientConfig,
    ) -> Self {
        Self {
            ledger,
            disclosure,
            engine_key,
            identity,
            config,
        }
    }

    /// The principal this client acts as.
    pub fn principal(&self) -> Principal {
        self.identity.principal()
    }

    /// The ledger this client submits to.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Create a document with a fresh secret.
    ///
    /// The body is encrypted before anything is submitted; an empty body
    /// stays empty.
    pub async fn create_document(&self, name: &str, plaintext: &str) -> Result<DocumentId> {
        let secret = SecretValue::generate();
        let body = envelope::encrypt(plaintext, secret.as_str())?;
        let input = InputEncryptor::new(self.engine_key, self.ledger.context())
            .encrypt(&secret, self.identity.signing())?;

        let id = self
            .ledger
            .create_document(name, &body, &input.ciphertext, &input.proof, &self.principal())
            .await?;

        info!(document = %id, owner = %self.principal(), "document created");
        Ok(id)
    }

    /// Share a document with `grantee`.
    pub async fn grant_access(&self, id: DocumentId, grantee: &Principal) -> Result<()> {
        self.ledger
            .grant_access(id, grantee, &self.principal())
            .await?;
        debug!(document = %id, %grantee, "access granted");
        Ok(())
    }

    /// Recover a document's secret from the engine.
    pub async fn recover_secret(&self, id: DocumentId) -> Result<SecretValue> {
        let record = self.ledger.get_document(id).await?;
        self.recover_handle(record.id, record.secret_handle).await
    }

    /// Recover the secret and decrypt the body.
    pub async fn open_document(&self, id: DocumentId) -> Result<OpenDocument> {
        let record = self.ledger.get_document(id).await?;
        let secret = self.recover_handle(record.id, record.secret_handle).await?;
        let plaintext = envelope::decrypt(&record.body, secret.as_str()).map_err(|e| {
            warn!(document = %id, "body did not decrypt under recovered secret");
            ClientError::from(e)
        })?;

        Ok(OpenDocument {
            record,
            secret,
            plaintext,
        })
    }

    /// Re-encrypt `text` under the document's secret and submit it.
    ///
    /// `doc` is refreshed from the ledger once the update is accepted.
    pub async fn save(&self, doc: &mut OpenDocument, text: &str) -> Result<()> {
        let body = envelope::encrypt(text, doc.secret.as_str())?;
        self.ledger
            .update_document_body(doc.id(), &body, &self.principal())
            .await?;

        doc.record = self.ledger.get_document(doc.id()).await?;
        doc.plaintext = text.to_string();
        debug!(document = %doc.id(), position = %doc.record.last_mutation, "document saved");
        Ok(())
    }

    /// Recover, encrypt and submit in one step.
    pub async fn edit_document(&self, id: DocumentId, text: &str) -> Result<()> {
        let secret = self.recover_secret(id).await?;
        let body = envelope::encrypt(text, secret.as_str())?;
        self.ledger
            .update_document_body(id, &body, &self.principal())
            .await?;
        debug!(document = %id, "document edited");
        Ok(())
    }

    /// Records owned by this client, in creation order.
    pub async fn owned_documents(&self) -> Result<Vec<DocumentRecord>> {
        let ids = self.ledger.owned_document_ids(&self.principal()).await?;
        self.fetch_all(ids).await
    }

    /// Records shared with this client, in first-grant order.
    pub async fn shared_documents(&self) -> Result<Vec<DocumentRecord>> {
        let ids = self.ledger.shared_document_ids(&self.principal()).await?;
        self.fetch_all(ids).await
    }

    async fn fetch_all(&self, ids: Vec<DocumentId>) -> Result<Vec<DocumentRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            records.push(self.ledger.get_document(id).await?);
        }
        Ok(records)
    }

    async fn recover_handle(&self, id: DocumentId, handle: SecretHandle) -> Result<SecretValue> {
        let request = DisclosureRequest::sign(
            self.identity.signing(),
            handle,
            self.identity.encryption_public_key(),
        );

        let timeout = self.config.disclosure_timeout;
        let sealed = match tokio::time::timeout(timeout, self.disclosure.disclose(&request)).await
        {
            Ok(sealed) => sealed?,
            Err(_) => {
                warn!(document = %id, ?timeout, "secret disclosure timed out");
                return Err(ClientError::Timeout(timeout));
            }
        };

        let secret = sealed.open(self.identity.encryption())?;
        debug!(document = %id, "secret recovered");
        Ok(secret)
    }
}
