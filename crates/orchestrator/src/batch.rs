//! Batch/DAG execution (spec §5, §8 scenarios 1-2): run every planned action
//! in a batch, respecting declared dependencies, after a pre-flight cycle
//! check over the whole batch.

use std::collections::BTreeMap;

use axon_core::ActionId;

use crate::model::{ActionExecutionState, ActionStatus, PlannedAction};
use crate::pipeline::Orchestrator;
use crate::ExecutionContext;

/// The outcome of running a whole batch: every action's final state, keyed
/// by id, in the order each action finished.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Final state of every planned action, including skipped ones.
    pub states: BTreeMap<ActionId, ActionExecutionState>,
}

impl BatchResult {
    /// True if every action in the batch succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.states.values().all(|s| s.status == ActionStatus::Succeeded)
    }
}

/// Run a full batch of planned actions against one [`Orchestrator`].
///
/// Performs a static cycle check over the whole batch before executing
/// anything (spec §8 scenario 2): if any circular reference exists, every
/// action in the batch is reported failed with a `state_inconsistent`
/// error naming the cycle, and nothing is called.
///
/// Otherwise actions run in dependency (topological) layers: an action only
/// starts once every action in its `dependencies` set has a terminal status.
/// An action whose dependency failed or was itself skipped is marked
/// `Skipped` rather than attempted, and an `ActionSkipped` event is emitted
/// for it. `ctx.previous_results` is updated with each action's output as it
/// completes, so later layers see resolved results.
pub async fn run_batch(orchestrator: &Orchestrator, ctx: &mut ExecutionContext, actions: &[PlannedAction]) -> BatchResult {
    let refs: Vec<axon_resolver::PlannedActionRef<'_>> =
        actions.iter().map(|a| axon_resolver::PlannedActionRef { id: &a.id, inputs: &a.inputs }).collect();
    let cycles = axon_resolver::detect_circular_references(&refs);

    let mut result = BatchResult::default();
    if !cycles.is_empty() {
        let message = format!("circular reference(s) detected in batch: {}", cycles.join(", "));
        for action in actions {
            let mut state = ActionExecutionState::pending(ctx.execution_id.clone(), action.id.clone());
            state.status = ActionStatus::Failed;
            state.error = Some(axon_core::ErrorDetail::state_inconsistent(message.clone()));
            result.states.insert(action.id.clone(), state);
        }
        return result;
    }

    let mut remaining: BTreeMap<ActionId, &PlannedAction> = actions.iter().map(|a| (a.id.clone(), a)).collect();

    while !remaining.is_empty() {
        let ready: Vec<ActionId> = remaining
            .iter()
            .filter(|(_, action)| action.dependencies.iter().all(|dep| result.states.contains_key(dep)))
            .map(|(id, _)| id.clone())
            .collect();

        if ready.is_empty() {
            // Every remaining action is blocked on something outside this
            // batch (an undeclared dependency) — resolve_inputs will report
            // the precise error per action when attempted.
            for id in remaining.keys().cloned().collect::<Vec<_>>() {
                let action = remaining.remove(&id).expect("key came from remaining.keys()");
                let state = orchestrator.execute_action(ctx, action).await;
                result.states.insert(id, state);
            }
            break;
        }

        for id in ready {
            let action = remaining.remove(&id).expect("id came from remaining via ready filter");
            let upstream_failed = action.dependencies.iter().any(|dep| {
                result.states.get(dep).is_none_or(|s| s.status != ActionStatus::Succeeded)
            });

            let state = if upstream_failed {
                orchestrator.emit_skipped(ctx, &id).await;
                let mut state = ActionExecutionState::pending(ctx.execution_id.clone(), id.clone());
                state.status = ActionStatus::Skipped;
                state
            } else {
                orchestrator.execute_action(ctx, action).await
            };

            if let Some(output) = &state.result {
                ctx.previous_results.insert(id.clone(), output.clone());
            }
            result.states.insert(id, state);
        }
    }

    result
}
