//! Canonical dedup-key derivation.

use std::collections::BTreeSet;

use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Compute the dedup key for one action invocation.
///
/// The key is stable across process restarts and across callers: it only
/// depends on the action definition id, its (already-resolved) inputs, and
/// its declared dependency set, never on timing or execution id. Object keys
/// are sorted at every nesting level — `serde_json::Value`'s map type is a
/// `BTreeMap` by default (this workspace does not enable the
/// `preserve_order` feature), so serializing a constructed `Value` already
/// produces a canonical key order without any extra sorting pass.
#[must_use]
pub fn compute_key(action_definition_id: &str, inputs: &Value, dependencies: &BTreeSet<String>) -> String {
    let envelope = json!({
        "actionDefinitionId": action_definition_id,
        "dependencies": dependencies.iter().collect::<Vec<_>>(),
        "inputs": inputs,
    });
    let bytes = serde_json::to_vec(&envelope).expect("constructed Value always serializes");
    let digest = Sha256::digest(&bytes);
    format!("action-exec:{}", hex::encode(digest))
}
