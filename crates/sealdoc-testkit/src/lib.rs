//! # sealdoc Testkit
//!
//! Testing utilities for sealdoc.
//!
//! ## Overview
//!
//! - **Fixtures**: named parties with deterministic keys, and a registry
//!   wired to an in-memory engine under a manual clock
//! - **Generators**: proptest strategies for principals, names, bodies,
//!   secrets and registry operation sequences
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use sealdoc_testkit::fixtures::{party, TestRegistry};
//!
//! async fn example() {
//!     let fixture = TestRegistry::new().await.unwrap();
//!     let alice = party("alice");
//!     let id = fixture.create(&alice, "Genesis").await.unwrap();
//!     assert!(fixture.registry.document_exists(id).await.unwrap());
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{multi_party, party, Party, TestRegistry};
pub use generators::{registry_ops, RegistryOp};
