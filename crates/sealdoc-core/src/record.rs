//! Document records.

use serde::{Deserialize, Serialize};

use crate::crypto::Principal;
use crate::types::{DocumentId, LedgerPosition, SecretHandle};

/// One document in the registry.
///
/// `owner`, `name` and `secret_handle` never change after creation. `body`
/// is ciphertext produced client-side and is public, as is every other
/// field; only the secret behind `secret_handle` is protected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Assigned at creation, never reused.
    pub id: DocumentId,

    /// The principal that created the document.
    pub owner: Principal,

    /// Public display name, never empty.
    pub name: String,

    /// Envelope payload. Empty means no body.
    pub body: String,

    /// Reference to the document key inside the confidential engine.
    pub secret_handle: SecretHandle,

    /// Ledger time of creation (Unix ms).
    pub created_at: i64,

    /// Ledger time of the last body mutation (Unix ms).
    pub updated_at: i64,

    /// Ledger position of the last body mutation.
    pub last_mutation: LedgerPosition,
}
