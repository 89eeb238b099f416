//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealdoc_core::{Keypair, Principal};
use sealdoc_perms::SecretValue;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a valid (non-null) principal.
pub fn principal() -> impl Strategy<Value = Principal> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a non-empty document name.
pub fn document_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _-]{1,32}"
}

/// Generate a plaintext body, possibly empty.
pub fn body_text() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), ".{1,256}"]
}

/// Generate a secret from mixed-case hex, as a user might paste it.
pub fn secret_value() -> impl Strategy<Value = SecretValue> {
    "0x[0-9a-fA-F]{40}".prop_map(SecretValue::new)
}

/// One registry call, with parties and documents given as indexes.
///
/// Indexes are resolved modulo the number of parties or created documents
/// when the operation is applied, so every generated sequence is usable.
#[derive(Debug, Clone)]
pub enum RegistryOp {
    Create {
        owner: usize,
        name: String,
    },
    Update {
        document: usize,
        editor: usize,
        body: String,
    },
    Grant {
        document: usize,
        grantee: usize,
        caller: usize,
    },
    GrantNull {
        document: usize,
        caller: usize,
    },
}

/// Generate a single registry operation.
pub fn registry_op() -> impl Strategy<Value = RegistryOp> {
    let index = 0usize..16;
    prop_oneof![
        3 => (index.clone(), prop_oneof![Just(String::new()), document_name()])
            .prop_map(|(owner, name)| RegistryOp::Create { owner, name }),
        3 => (index.clone(), index.clone(), "[a-z]{0,16}")
            .prop_map(|(document, editor, body)| RegistryOp::Update { document, editor, body }),
        3 => (index.clone(), index.clone(), index.clone()).prop_map(
            |(document, grantee, caller)| RegistryOp::Grant { document, grantee, caller }
        ),
        1 => (index.clone(), index)
            .prop_map(|(document, caller)| RegistryOp::GrantNull { document, caller }),
    ]
}

/// Generate a sequence of registry operations.
pub fn registry_ops(max_len: usize) -> impl Strategy<Value = Vec<RegistryOp>> {
    prop::collection::vec(registry_op(), 1..=max_len)
}
