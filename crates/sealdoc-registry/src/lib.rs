//! # sealdoc Registry
//!
//! The authoritative store of document metadata. Every mutation is gated
//! by the [`ConfidentialKeyGateway`](sealdoc_perms::ConfidentialKeyGateway),
//! applied as one atomic commit, and announced as a [`LedgerEntry`].
//!
//! ## Operations
//!
//! | Operation | Failure kinds |
//! |---|---|
//! | [`create_document`](DocumentRegistry::create_document) | `NameRequired`, `ProofInvalid`, `Store(IdSpaceExhausted)` |
//! | [`update_document_body`](DocumentRegistry::update_document_body) | `NotFound`, `Unauthorized` |
//! | [`grant_access`](DocumentRegistry::grant_access) | `InvalidGrantee`, `NotFound`, `Unauthorized` |
//! | [`get_document`](DocumentRegistry::get_document) | `NotFound` |
//!
//! Index reads, [`document_exists`](DocumentRegistry::document_exists) and
//! [`total_documents`](DocumentRegistry::total_documents) never fail on
//! missing data.
//!
//! Records are public: anyone can read a body. Only the secret that
//! decrypts it is protected, and that lives in the engine.
//!
//! [`LedgerEntry`]: sealdoc_core::LedgerEntry

pub mod config;
pub mod error;
pub mod registry;

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use registry::DocumentRegistry;
