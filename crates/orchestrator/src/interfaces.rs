//! External interfaces the orchestrator depends on but does not implement
//! (spec §6): storage, the action-definition catalog, logging, and
//! lifecycle events. Production callers supply real implementations; tests
//! use the in-memory fakes under `tests/support/`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use axon_core::{ActionDefinitionId, ActionId, ErrorCategory, ErrorDetail, ExecutionId};

use crate::model::{ActionDefinition, ActionExecutionState};

/// Durable storage for [`ActionExecutionState`] records.
///
/// A `save_result` failure does not invalidate an already-successful
/// execution (spec §7/§4.8 P8): the orchestrator falls back to an ephemeral
/// in-memory location and still reports the action as succeeded, logging the
/// storage failure rather than surfacing it as the action's own error.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Persist one action's execution state.
    async fn save_result(&self, state: &ActionExecutionState) -> Result<(), ErrorDetail>;

    /// Load a previously persisted execution state, if any.
    async fn load_result(&self, execution_id: &ExecutionId, action_id: &ActionId) -> Result<Option<ActionExecutionState>, ErrorDetail>;
}

/// A single vendor-specific override translating one HTTP status onto a
/// category other than the built-in table's (spec §6 point 2). Catalog
/// mappings are consulted only after the built-in categorizer has already
/// run, and only replace its verdict for the status they name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMapping {
    /// HTTP status this override applies to.
    pub status: u16,
    /// Resulting category.
    pub category: ErrorCategory,
    /// Resulting retryability.
    pub retryable: bool,
}

/// How a vendor signals and recovers from rate limiting, beyond the generic
/// `429`/`Retry-After` handling every endpoint gets for free.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RateLimitingConfig {
    /// Header that signals a rate-limit response, if not a `429` status.
    #[serde(default)]
    pub detection_header: Option<String>,
    /// Header to read a vendor-specific retry hint from, if not `Retry-After`.
    #[serde(default)]
    pub extraction_header: Option<String>,
    /// Vendor-documented backoff strategy name, surfaced for operators; not
    /// interpreted by this executor.
    #[serde(default)]
    pub backoff_strategy: Option<String>,
}

/// Per-vendor deviations from plain HTTP/JSON that the pipeline must work
/// around. Every field is additive — a catalog entry can only loosen how a
/// response is read, never override a hard safety default like response
/// size caps enforced by [`axon_http::HttpEngineConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiQuirks {
    /// Send this literal `User-Agent` value; some vendors reject requests
    /// without one or without a specific format.
    #[serde(default)]
    pub requires_user_agent: Option<String>,
    /// The vendor serves JSON under a non-standard `Content-Type`, so the
    /// response should still be parsed as JSON despite the header.
    #[serde(default)]
    pub non_standard_json_content_type: Option<String>,
    /// Reject responses larger than this many bytes for this endpoint
    /// specifically, tighter than the engine-wide default.
    #[serde(default)]
    pub max_response_size: Option<u64>,
    /// The vendor returns HTTP 2xx with an error payload in the body
    /// instead of a matching error status (spec §6 point 2). When set, a
    /// 2xx body containing a top-level `error` key is treated as a failure.
    #[serde(default)]
    pub success_with_error_body: bool,
}

/// One action definition plus the catalog-level metadata about the vendor
/// it calls: declared error overrides, rate-limit signaling, and quirks.
/// Before this type existed, [`ApiCatalog::get`] returned a bare
/// [`ActionDefinition`], which conflated "the registry of known actions"
/// with "what we know about how this vendor actually behaves" — the two
/// are now separate fields of the same lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCatalogEntry {
    /// The action's endpoint, auth, and schemas.
    pub definition: ActionDefinition,
    /// Vendor-specific status overrides (spec §6 point 2).
    #[serde(default)]
    pub error_mappings: Vec<ErrorMapping>,
    /// Vendor-specific rate-limit signaling.
    #[serde(default)]
    pub rate_limiting: RateLimitingConfig,
    /// Vendor-specific response quirks.
    #[serde(default)]
    pub quirks: ApiQuirks,
}

/// Read access to the registered [`ApiCatalogEntry`]s.
#[async_trait]
pub trait ApiCatalog: Send + Sync {
    /// Look up one catalog entry by its action definition id.
    async fn get(&self, id: &ActionDefinitionId) -> Option<ApiCatalogEntry>;
}

/// Structured logging seam. The default methods forward to `tracing`, so
/// most callers never need to implement this trait at all — it exists so
/// tests and alternate deployments can redirect or assert on log output.
pub trait Logger: Send + Sync {
    /// Log an informational event.
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    /// Log a warning.
    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    /// Log an error.
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// The default [`Logger`], forwarding everything to `tracing` with no
/// additional behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {}

/// A lifecycle event emitted as an action moves through the pipeline.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    /// An action started executing.
    ActionStarted { execution_id: ExecutionId, action_id: ActionId },
    /// An action finished successfully.
    ActionSucceeded { execution_id: ExecutionId, action_id: ActionId },
    /// An action finished with a terminal failure.
    ActionFailed { execution_id: ExecutionId, action_id: ActionId, error: ErrorDetail },
    /// An action was skipped because an upstream dependency failed.
    ActionSkipped { execution_id: ExecutionId, action_id: ActionId },
}

/// Receives [`ExecutionEvent`]s as the pipeline runs.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Handle one event. Implementations should not block the pipeline for
    /// long; slow sinks should buffer internally.
    async fn emit(&self, event: ExecutionEvent);
}

/// An [`EventSink`] that drops every event, for callers with no interest in
/// lifecycle notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn emit(&self, _event: ExecutionEvent) {}
}
