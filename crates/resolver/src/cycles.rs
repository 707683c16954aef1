//! Static, whole-DAG cycle detection (spec §4.1: "Static cycle detector").
//!
//! Unlike [`crate::resolve::resolve_inputs`]'s per-resolution `visiting`
//! set, this walks the declared reference graph of an entire batch of
//! planned actions up front, before any execution happens, and reports
//! every distinct cycle it finds rather than stopping at the first.

use std::collections::{BTreeMap, HashSet};

use axon_core::ActionId;
use serde_json::Value;

use crate::reference::parse_reference;

/// A read-only view of one planned action, enough to extract its
/// reference edges. Kept independent of the orchestrator's `PlannedAction`
/// type so this crate has no dependency on it.
#[derive(Debug, Clone, Copy)]
pub struct PlannedActionRef<'a> {
    /// The action's own id.
    pub id: &'a ActionId,
    /// Its (unresolved) input map.
    pub inputs: &'a BTreeMap<String, Value>,
}

/// Find every action id referenced anywhere in `inputs`.
fn referenced_action_ids(inputs: &BTreeMap<String, Value>) -> Vec<ActionId> {
    inputs
        .values()
        .filter_map(|v| v.as_str())
        .filter_map(parse_reference)
        .map(|r| ActionId::new(r.action_id))
        .collect()
}

/// Detect every distinct cycle in the reference graph formed by `actions`.
///
/// Returns a human-readable string per cycle, e.g. `"a -> b -> c -> a"`.
/// An empty result means the graph is acyclic.
#[must_use]
pub fn detect_circular_references(actions: &[PlannedActionRef<'_>]) -> Vec<String> {
    let mut graph: BTreeMap<ActionId, Vec<ActionId>> = BTreeMap::new();
    for action in actions {
        graph.entry(action.id.clone()).or_default().extend(referenced_action_ids(action.inputs));
    }

    let mut cycles = Vec::new();
    let mut done: HashSet<ActionId> = HashSet::new();

    for start in graph.keys().cloned().collect::<Vec<_>>() {
        if done.contains(&start) {
            continue;
        }
        let mut path = vec![start.clone()];
        let mut on_path: HashSet<ActionId> = HashSet::from([start.clone()]);
        walk(&start, &graph, &mut path, &mut on_path, &mut done, &mut cycles);
    }

    cycles
}

fn walk(
    node: &ActionId,
    graph: &BTreeMap<ActionId, Vec<ActionId>>,
    path: &mut Vec<ActionId>,
    on_path: &mut HashSet<ActionId>,
    done: &mut HashSet<ActionId>,
    cycles: &mut Vec<String>,
) {
    if let Some(neighbors) = graph.get(node) {
        for next in neighbors {
            if on_path.contains(next) {
                let start = path.iter().position(|n| n == next).expect("next is on_path");
                let mut cycle: Vec<String> = path[start..].iter().map(ActionId::to_string).collect();
                cycle.push(next.to_string());
                cycles.push(cycle.join(" -> "));
                continue;
            }
            if done.contains(next) {
                continue;
            }
            path.push(next.clone());
            on_path.insert(next.clone());
            walk(next, graph, path, on_path, done, cycles);
            on_path.remove(next);
            path.pop();
        }
    }
    done.insert(node.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action<'a>(id: &'a ActionId, inputs: &'a BTreeMap<String, Value>) -> PlannedActionRef<'a> {
        PlannedActionRef { id, inputs }
    }

    #[test]
    fn acyclic_graph_reports_no_cycles() {
        let a = ActionId::new("a");
        let b = ActionId::new("b");
        let a_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${b.y}"))]);
        let b_inputs: BTreeMap<String, Value> = BTreeMap::new();
        let actions = [action(&a, &a_inputs), action(&b, &b_inputs)];
        assert!(detect_circular_references(&actions).is_empty());
    }

    #[test]
    fn three_node_cycle_is_detected() {
        // spec §8 scenario 2: A -> B -> C -> A
        let a = ActionId::new("A");
        let b = ActionId::new("B");
        let c = ActionId::new("C");
        let a_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${B.y}"))]);
        let b_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${C.y}"))]);
        let c_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${A.y}"))]);
        let actions = [action(&a, &a_inputs), action(&b, &b_inputs), action(&c, &c_inputs)];

        let cycles = detect_circular_references(&actions);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].contains('A') && cycles[0].contains('B') && cycles[0].contains('C'));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let a = ActionId::new("a");
        let a_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${a.y}"))]);
        let actions = [action(&a, &a_inputs)];
        let cycles = detect_circular_references(&actions);
        assert_eq!(cycles, vec!["a -> a".to_string()]);
    }

    #[test]
    fn disjoint_cycles_are_both_reported() {
        let a = ActionId::new("a");
        let b = ActionId::new("b");
        let c = ActionId::new("c");
        let d = ActionId::new("d");
        let a_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${b.y}"))]);
        let b_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${a.y}"))]);
        let c_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${d.y}"))]);
        let d_inputs: BTreeMap<String, Value> = BTreeMap::from([("x".into(), json!("${c.y}"))]);
        let actions =
            [action(&a, &a_inputs), action(&b, &b_inputs), action(&c, &c_inputs), action(&d, &d_inputs)];

        let cycles = detect_circular_references(&actions);
        assert_eq!(cycles.len(), 2);
    }
}
