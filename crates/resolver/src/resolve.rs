//! Depth-first substitution of reference expressions (spec §4.1).

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use axon_core::{ActionId, ErrorDetail};
use serde_json::Value;

use crate::path::{parse_path, traverse};
use crate::reference::{parse_reference, reference_key};

/// Resolve every input value of one planned action.
///
/// Literal scalars pass through unchanged (including `""`, `false`, `0`).
/// Reference values are substituted by traversing `previous_results`,
/// resolving transitively if the resolved value is itself a reference.
pub fn resolve_inputs(
    inputs: &BTreeMap<String, Value>,
    dependencies: &BTreeSet<ActionId>,
    previous_results: &BTreeMap<ActionId, Value>,
) -> Result<BTreeMap<String, Value>, ErrorDetail> {
    let mut resolved = BTreeMap::new();
    for (name, value) in inputs {
        let mut visiting = Vec::new();
        let value = resolve_value(value, dependencies, previous_results, &mut visiting)
            .map_err(|e| e.with_context("inputName", name.as_str()))?;
        resolved.insert(name.clone(), value);
    }
    Ok(resolved)
}

fn resolve_value(
    value: &Value,
    dependencies: &BTreeSet<ActionId>,
    previous_results: &BTreeMap<ActionId, Value>,
    visiting: &mut Vec<String>,
) -> Result<Value, ErrorDetail> {
    let Some(s) = value.as_str() else {
        return Ok(value.clone());
    };
    let Some(reference) = parse_reference(s) else {
        return Ok(value.clone());
    };

    let action_id = ActionId::new(reference.action_id.clone());
    if !dependencies.contains(&action_id) {
        return Err(ErrorDetail::validation_failed(format!(
            "reference to action {} not found in dependencies",
            reference.action_id
        )));
    }

    let key = reference_key(&reference);
    if let Some(start) = visiting.iter().position(|k| k == &key) {
        let mut cycle = visiting[start..].to_vec();
        cycle.push(key.clone());
        return Err(ErrorDetail::validation_failed(format!(
            "circular reference detected: {}",
            cycle.join(" -> ")
        )));
    }

    visiting.push(key);

    let result = (|| {
        let prior = previous_results.get(&action_id).ok_or_else(|| {
            ErrorDetail::state_inconsistent(format!(
                "no previous result recorded for action `{}`",
                reference.action_id
            ))
        })?;
        let segments = parse_path(&reference.path).map_err(ErrorDetail::validation_failed)?;
        let leaf = traverse(prior, &segments).map_err(ErrorDetail::validation_failed)?.clone();
        resolve_value(&leaf, dependencies, previous_results, visiting)
    })();

    visiting.pop();
    result
}
