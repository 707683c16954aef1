//! The action executor's data model (spec §3).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use axon_core::{ActionDefinitionId, ActionId, ErrorDetail, ExecutionId};
use axon_http::RetryPolicy;
use axon_schema::Schema;
use axon_trace::TraceEntry;

/// Where and how to call one action's downstream API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    /// HTTP method, e.g. `"POST"`.
    pub method: String,
    /// Absolute URL. Path/query templating, if any, is resolved by the
    /// caller before this reaches the engine — this field is the literal
    /// URL to call.
    pub url: String,
    /// Headers to send on every call to this endpoint, before authentication
    /// headers are layered on top.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// How to authenticate calls to one action's endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthenticationConfig {
    /// No authentication.
    None,
    /// Static bearer token.
    Bearer {
        /// The token value, sent as `Authorization: Bearer <token>`.
        token: String,
    },
    /// Header-based API key.
    ApiKey {
        /// Header name to send the key in.
        header: String,
        /// The key value.
        value: String,
    },
    /// HTTP Basic authentication.
    Basic {
        /// Basic auth username.
        username: String,
        /// Basic auth password.
        password: String,
    },
    /// OAuth2 refresh-token grant, refreshed transparently per call
    /// (spec §4.6). The refresh token is established out of band (an
    /// authorization-code exchange this executor does not perform) and
    /// handed to it here as a starting credential to rotate.
    OAuth2 {
        /// Token endpoint URL.
        token_url: String,
        /// OAuth2 client id.
        client_id: String,
        /// OAuth2 client secret.
        client_secret: String,
        /// The current refresh token to present on the next rotation.
        refresh_token: String,
        /// Optional scope string.
        #[serde(default)]
        scope: Option<String>,
    },
}

/// The static, catalog-registered shape of one action kind: what endpoint it
/// calls, how to authenticate, and what its inputs/outputs must look like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Stable identifier for this action kind, referenced by [`PlannedAction::action_definition_id`].
    pub id: ActionDefinitionId,
    /// Human-readable summary, surfaced in catalogs/UIs.
    #[serde(default)]
    pub description: String,
    /// Free-form labels for catalog search/filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Endpoint this action calls.
    pub endpoint: Endpoint,
    /// How to authenticate calls to that endpoint.
    pub authentication: AuthenticationConfig,
    /// JSON Schema the resolved inputs must satisfy before the call is made.
    pub input_schema: Schema,
    /// JSON Schema the response body must satisfy, if the response is validated.
    #[serde(default)]
    pub output_schema: Option<Schema>,
    /// Retry/backoff tuning for calls to this action's endpoint (spec §3).
    /// Non-optional: every action declares its own policy rather than
    /// silently inheriting a global default, so that side-effecting actions
    /// can opt into `conservative()`-style tuning at the definition site.
    pub retry_policy: RetryPolicy,
}

/// One concrete invocation of an [`ActionDefinition`] within a DAG of actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAction {
    /// Caller-chosen identifier, unique within the batch, used by downstream
    /// actions' `${actionId.path}` references.
    pub id: ActionId,
    /// Which [`ActionDefinition`] this invocation uses.
    pub action_definition_id: ActionDefinitionId,
    /// Unresolved inputs — may contain `${actionId.path}` reference strings.
    pub inputs: BTreeMap<String, Value>,
    /// Declared upstream actions this one is allowed to reference.
    #[serde(default)]
    pub dependencies: BTreeSet<ActionId>,
}

/// Identifies one run of a batch of planned actions.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique id for this run.
    pub execution_id: ExecutionId,
    /// Results of actions that have already finished in this run, keyed by
    /// their [`ActionId`] — the data [`axon_resolver`] reads references from.
    pub previous_results: BTreeMap<ActionId, Value>,
}

impl ExecutionContext {
    /// Start a fresh run with no prior results.
    #[must_use]
    pub fn new(execution_id: ExecutionId) -> Self {
        Self { execution_id, previous_results: BTreeMap::new() }
    }
}

/// Terminal or in-flight status of one action's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Not yet started (its dependencies have not all finished).
    Pending,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Succeeded,
    /// Finished with a terminal (non-retryable, or retries-exhausted) failure.
    Failed,
    /// Skipped because an upstream dependency failed.
    Skipped,
}

/// Where a `Succeeded` action's output was actually written (spec §3's
/// `result.outputLocation`) — the primary store, or the ephemeral fallback
/// when [`crate::interfaces::StorageProvider::save_result`] failed without
/// invalidating the underlying success (spec §4.8 P8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLocation {
    /// Which store holds the output, e.g. `"primary"` or `"ephemeral"`.
    pub provider: String,
    /// An opaque, provider-specific locator for the stored output.
    pub path: String,
    /// Set when the primary store rejected the write and this location
    /// describes the fallback instead (spec §4.8 P8).
    #[serde(default)]
    pub storage_failure: bool,
    /// Whether the storage failure that caused the fallback looks
    /// transient (and so worth a caller-driven retry of the persist step).
    #[serde(default)]
    pub storage_error_retryable: bool,
}

/// The persisted record of one action's execution within a run.
///
/// Mirrors spec §3's `result ∈ Success{output, outputLocation} |
/// Failure{error, partialOutput?}`: `result`/`output_location` are set only
/// on `Succeeded`, `error`/`partial_output` only on `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionExecutionState {
    /// Which run this belongs to.
    pub execution_id: ExecutionId,
    /// Which planned action this is.
    pub action_id: ActionId,
    /// Current status.
    pub status: ActionStatus,
    /// Number of HTTP attempts made so far.
    pub attempt_history_len: u32,
    /// The action's output, once `Succeeded`.
    #[serde(default)]
    pub result: Option<Value>,
    /// Where `result` was persisted, once `Succeeded`.
    #[serde(default)]
    pub output_location: Option<OutputLocation>,
    /// The terminal failure, once `Failed`.
    #[serde(default)]
    pub error: Option<ErrorDetail>,
    /// Whatever response body was readable before the failure occurred, if
    /// any — e.g. a response that failed output-schema validation still has
    /// a body worth surfacing to the caller.
    #[serde(default)]
    pub partial_output: Option<Value>,
    /// Sanitized trace of every HTTP attempt made for this action.
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

impl ActionExecutionState {
    /// A fresh, not-yet-started record.
    #[must_use]
    pub fn pending(execution_id: ExecutionId, action_id: ActionId) -> Self {
        Self {
            execution_id,
            action_id,
            status: ActionStatus::Pending,
            attempt_history_len: 0,
            result: None,
            output_location: None,
            error: None,
            partial_output: None,
            trace: Vec::new(),
        }
    }
}
