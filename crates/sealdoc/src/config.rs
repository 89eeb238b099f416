//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`DocumentClient`](crate::DocumentClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long to wait for the engine to disclose a secret.
    pub disclosure_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            disclosure_timeout: Duration::from_secs(30),
        }
    }
}
