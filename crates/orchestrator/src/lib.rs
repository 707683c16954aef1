//! Wires DAG input resolution, schema validation, authentication, retried
//! and circuit-broken HTTP execution, request deduplication, and result
//! persistence into the end-to-end reliable HTTP action executor.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod interfaces;
mod model;
mod pipeline;

pub use batch::{run_batch, BatchResult};
pub use interfaces::{
    ApiCatalog, ApiCatalogEntry, ApiQuirks, ErrorMapping, EventSink, ExecutionEvent, Logger, NullEventSink, RateLimitingConfig,
    StorageProvider, TracingLogger,
};
pub use model::{
    ActionDefinition, ActionExecutionState, ActionStatus, AuthenticationConfig, Endpoint, ExecutionContext, OutputLocation,
    PlannedAction,
};
pub use pipeline::{Orchestrator, OrchestratorConfig};
