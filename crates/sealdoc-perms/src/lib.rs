//! # sealdoc Permissions
//!
//! The bridge between externally encrypted document secrets and the
//! confidential-compute engine that holds them.
//!
//! ## Overview
//!
//! A document key is a [`SecretValue`] that must never appear in cleartext
//! on the shared ledger. Clients seal it to the engine's input key and sign a
//! [`CapabilityProof`] binding the ciphertext to themselves and to one
//! registry context. The [`ConfidentialKeyGateway`] hands both to the
//! engine, receives an opaque [`SecretHandle`](sealdoc_core::SecretHandle),
//! and from then on only asks yes/no permission questions about it.
//!
//! ## Key Concepts
//!
//! - **ConfidentialEngine**: import-with-proof, allow, is-allowed. Injected.
//! - **DisclosureService**: how a permitted principal recovers the secret.
//! - **MemoryEngine**: in-process engine for tests and local deployments.
//!
//! ## Encryption Model
//!
//! Both the engine input and disclosures are [`SealedBox`]es: ephemeral
//! X25519 agreement and ChaCha20-Poly1305, keyed by Blake3 over the shared
//! secret, a purpose string and a binding (the registry context for inputs,
//! the handle for disclosures).

pub mod crypto;
pub mod disclosure;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod proof;
pub mod secret;

pub use crypto::{SealedBox, X25519PublicKey, X25519StaticSecret};
pub use disclosure::{DisclosureRequest, SealedSecret};
pub use engine::{ConfidentialEngine, DisclosureService};
pub use error::{PermsError, Result};
pub use gateway::ConfidentialKeyGateway;
pub use memory::MemoryEngine;
pub use proof::{CapabilityProof, EncryptedInput, ExternalCiphertext, InputEncryptor};
pub use secret::SecretValue;
