//! # sealdoc Core
//!
//! Pure primitives shared by every sealdoc crate: principals, document
//! records, ledger entries and ledger time.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Principal`] - An identity that can own or be granted a document
//! - [`DocumentId`] - Positive, strictly increasing document identifier
//! - [`SecretHandle`] - Opaque reference to a confidentially held secret
//! - [`DocumentRecord`] - One registry entry
//! - [`LedgerEntry`] - A committed notification in the registry ledger

pub mod clock;
pub mod crypto;
pub mod error;
pub mod event;
pub mod record;
pub mod types;

pub use clock::{LedgerClock, ManualTimeSource, SystemTimeSource, TimeSource};
pub use crypto::{Keypair, Principal, Signature};
pub use error::{CoreError, Result};
pub use event::{LedgerEntry, RegistryEvent};
pub use record::DocumentRecord;
pub use types::{ContextId, DocumentId, LedgerPosition, SecretHandle};
