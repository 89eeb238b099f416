//! Document secrets.

use rand::RngCore;
use std::fmt;

/// The secret a document key is derived from.
///
/// A textual identifier (a `0x`-prefixed 20-byte hex string when generated
/// here). Always held in canonical lowercase form, which is the form the
/// body envelope hashes.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wrap an existing secret, normalizing it to lowercase.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().to_lowercase())
    }

    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// The canonical textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_utf8(bytes: Vec<u8>) -> Option<Self> {
        String::from_utf8(bytes).ok().map(Self::new)
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}
