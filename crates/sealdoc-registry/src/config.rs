//! Registry configuration.

use serde::{Deserialize, Serialize};

use sealdoc_core::{ContextId, DocumentId};

use crate::error::{RegistryError, Result};

/// Configuration for a [`DocumentRegistry`](crate::DocumentRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name the registry context is derived from. Capability proofs are
    /// bound to it, so two registries with different names never accept
    /// each other's submissions.
    pub context_name: String,
    /// Id given to the first document. Must be positive and at most
    /// `DocumentId::MAX`.
    pub first_document_id: u64,
    /// Buffered notifications per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            context_name: "sealdoc".to_string(),
            first_document_id: 1,
            event_capacity: 256,
        }
    }
}

impl RegistryConfig {
    /// The context proofs must be bound to.
    pub fn context(&self) -> ContextId {
        ContextId::derive(&self.context_name)
    }

    /// Check the configuration and return the first document id.
    pub fn validate(&self) -> Result<DocumentId> {
        if self.event_capacity == 0 {
            return Err(RegistryError::InvalidConfig(
                "event_capacity must be positive".to_string(),
            ));
        }
        let first = DocumentId::new(self.first_document_id).ok_or_else(|| {
            RegistryError::InvalidConfig("first_document_id must be positive".to_string())
        })?;
        if first > DocumentId::MAX {
            return Err(RegistryError::InvalidConfig(format!(
                "first_document_id must not exceed {}",
                DocumentId::MAX.get()
            )));
        }
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RegistryConfig::default();
        assert_eq!(config.validate().unwrap(), DocumentId(1));
        assert_eq!(config.context(), ContextId::derive("sealdoc"));
    }

    #[test]
    fn test_zero_first_id_rejected() {
        let config = RegistryConfig {
            first_document_id: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_first_id_beyond_max_rejected() {
        let config = RegistryConfig {
            first_document_id: u64::MAX,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidConfig(_))
        ));

        let config = RegistryConfig {
            first_document_id: DocumentId::MAX.get(),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap(), DocumentId::MAX);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = RegistryConfig {
            event_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RegistryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"context_name":"staging"}"#).unwrap();
        assert_eq!(config.context_name, "staging");
        assert_eq!(config.first_document_id, 1);
        assert_eq!(config.event_capacity, 256);
    }
}
