//! # sealdoc Envelope
//!
//! Protects a document body with a key derived from the document secret,
//! independent of the ledger.
//!
//! ## Wire Format
//!
//! ```text
//! base64( nonce[12] || ciphertext || tag[16] )
//! ```
//!
//! The empty string is the envelope of the empty body, in both directions.
//!
//! ## Usage
//!
//! ```rust
//! use sealdoc_envelope::{decrypt, encrypt};
//!
//! let payload = encrypt("meeting notes", "0xABC123").unwrap();
//! let plaintext = decrypt(&payload, "0xabc123").unwrap();
//! assert_eq!(plaintext, "meeting notes");
//! ```

pub mod envelope;
pub mod error;

pub use envelope::{decrypt, decrypt_with_key, encrypt, encrypt_with_key, SymmetricKey, NONCE_LEN};
pub use error::{EnvelopeError, Result};
