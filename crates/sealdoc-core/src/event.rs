//! Registry notifications and the ledger entries that carry them.
//!
//! Every committed registry mutation appends exactly one [`LedgerEntry`].
//! External observers and indexers consume these in position order.

use serde::{Deserialize, Serialize};

use crate::crypto::Principal;
use crate::error::{CoreError, Result};
use crate::types::{DocumentId, LedgerPosition};

/// A notification emitted by a committed registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A document was created.
    DocumentCreated {
        document_id: DocumentId,
        owner: Principal,
        name: String,
    },

    /// A document body was replaced. Emitted even if the body is unchanged.
    DocumentUpdated {
        document_id: DocumentId,
        editor: Principal,
        new_body: String,
    },

    /// A principal was granted decrypt permission on a document.
    AccessGranted {
        document_id: DocumentId,
        grantee: Principal,
    },
}

impl RegistryEvent {
    /// The document this event concerns.
    pub fn document_id(&self) -> DocumentId {
        match self {
            RegistryEvent::DocumentCreated { document_id, .. }
            | RegistryEvent::DocumentUpdated { document_id, .. }
            | RegistryEvent::AccessGranted { document_id, .. } => *document_id,
        }
    }
}

/// A committed notification at a ledger position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Position of the transaction that emitted the event.
    pub position: LedgerPosition,

    /// Ledger time of the transaction (Unix ms).
    pub timestamp: i64,

    /// The notification itself.
    pub event: RegistryEvent,
}

impl LedgerEntry {
    /// Serialize to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::EncodingError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
    }

    /// Render as a JSON object for external indexers.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LedgerEntry {
        LedgerEntry {
            position: LedgerPosition(4),
            timestamp: 1_736_870_400_000,
            event: RegistryEvent::DocumentUpdated {
                document_id: DocumentId(9),
                editor: Principal::from_bytes([0x11; 32]),
                new_body: "AAAA".to_string(),
            },
        }
    }

    #[test]
    fn test_entry_cbor_roundtrip() {
        let entry = sample();
        let bytes = entry.to_cbor().unwrap();
        assert_eq!(LedgerEntry::from_cbor(&bytes).unwrap(), entry);
    }

    #[test]
    fn test_entry_json_is_tagged() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"type\":\"document_updated\""));
        assert!(json.contains("\"new_body\":\"AAAA\""));
    }

    #[test]
    fn test_garbage_cbor_rejected() {
        assert!(LedgerEntry::from_cbor(&[0xff, 0x00]).is_err());
    }

    #[test]
    fn test_event_document_id() {
        let event = RegistryEvent::AccessGranted {
            document_id: DocumentId(3),
            grantee: Principal::from_bytes([0x22; 32]),
        };
        assert_eq!(event.document_id(), DocumentId(3));
    }
}
