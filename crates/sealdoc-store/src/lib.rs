//! # sealdoc Store
//!
//! Storage abstraction for the document registry. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The registry never writes piecemeal. Every mutation is described as one
//! [`Commit`] and the store applies it atomically: the record change, the
//! index change, and the ledger entry all land together or not at all.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Commit`] - One atomic registry mutation
//! - [`LedgerHead`] - Position and time of the last committed mutation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealdoc_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("registry.db").unwrap();
//!     let head = store.head().await.unwrap();
//!     println!("ledger at {}", head.position);
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Commit, LedgerHead, Store};
