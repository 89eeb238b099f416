//! # sealdoc
//!
//! A confidential document registry. Document metadata and encrypted bodies
//! are public; the secret each body is encrypted under is held by a
//! confidential-compute engine that only discloses it to permitted
//! principals.
//!
//! ## Overview
//!
//! - **Registry**: authoritative records, owner and share indexes, and a
//!   notification log. Every mutation is gated by the engine's permission
//!   check for the document's secret.
//! - **Gateway**: the registry's only route to the engine. It imports
//!   submitted secrets and answers permission questions; it never sees a
//!   secret's value.
//! - **Envelope**: client-side body encryption with a key derived from the
//!   recovered secret.
//! - **Client**: [`DocumentClient`] runs the pipeline: create, share,
//!   recover the secret, decrypt, edit, re-encrypt, submit.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sealdoc::{ClientConfig, DocumentClient, DocumentRegistry, Identity, RegistryConfig};
//! use sealdoc::perms::MemoryEngine;
//! use sealdoc::store::SqliteStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(MemoryEngine::new());
//!     let store = SqliteStore::open("registry.db")?;
//!     let registry = DocumentRegistry::open(store, engine.clone(), RegistryConfig::default());
//!     let registry = Arc::new(registry.await?);
//!
//!     let alice = DocumentClient::new(
//!         registry,
//!         engine.clone(),
//!         engine.input_public_key(),
//!         Identity::generate(),
//!         ClientConfig::default(),
//!     );
//!
//!     let id = alice.create_document("Genesis", "first draft").await?;
//!     let mut doc = alice.open_document(id).await?;
//!     alice.save(&mut doc, "second draft").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sealdoc::core` - Identifiers, records, ledger entries and clock
//! - `sealdoc::perms` - Gateway, engine interface and capability proofs
//! - `sealdoc::envelope` - Body encryption
//! - `sealdoc::store` - Storage abstraction and SQLite
//! - `sealdoc::registry` - The document registry

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;

// Re-export component crates
pub use sealdoc_core as core;
pub use sealdoc_envelope as envelope;
pub use sealdoc_perms as perms;
pub use sealdoc_registry as registry;
pub use sealdoc_store as store;

// Re-export main types for convenience
pub use client::{DocumentClient, OpenDocument};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use identity::Identity;
pub use ledger::Ledger;

pub use sealdoc_core::{DocumentId, DocumentRecord, LedgerEntry, Principal, RegistryEvent};
pub use sealdoc_registry::{DocumentRegistry, RegistryConfig, RegistryError};
