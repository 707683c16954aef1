//! The end-to-end action pipeline (spec §4.8): resolve, validate, dedupe,
//! authenticate, execute with retry, validate the response, persist.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use dashmap::DashMap;
use serde_json::Value;

use axon_core::{ActionId, ErrorCategory, ErrorDetail, ExecutionId};
use axon_dedup::{Admission, DedupCache, DedupConfig, Outcome as DedupOutcome};
use axon_http::{HttpEngine, HttpEngineConfig, HttpResponse, OutboundRequest, RetryController, RetryPolicy};
use axon_oauth::{OAuthConfig, TokenManager};
use axon_resilience::{CircuitBreakerConfig, CircuitBreakerRegistry};
use axon_schema::ValidationError;

use crate::interfaces::{ApiCatalog, ApiCatalogEntry, EventSink, ExecutionEvent, Logger, NullEventSink, StorageProvider, TracingLogger};
use crate::model::{ActionExecutionState, ActionStatus, AuthenticationConfig, OutputLocation, PlannedAction};
use crate::ExecutionContext;

/// Every collaborator the pipeline wires together. Built once and reused
/// across a process's executions — the dedup cache, circuit breakers, and
/// OAuth token cache are all shared state across runs by design.
pub struct Orchestrator {
    catalog: Arc<dyn ApiCatalog>,
    storage: Arc<dyn StorageProvider>,
    events: Arc<dyn EventSink>,
    logger: Arc<dyn Logger>,
    dedup: DedupCache,
    retry: RetryController,
    oauth: TokenManager,
    ephemeral: DashMap<(ExecutionId, ActionId), ActionExecutionState>,
}

/// Construction-time configuration, separate from the trait objects so
/// callers can override retry/circuit-breaker/dedup tuning without
/// re-implementing any interface.
#[derive(Default)]
pub struct OrchestratorConfig {
    /// HTTP engine tuning (timeouts, response size cap).
    pub http: HttpEngineConfig,
    /// Retry attempt/backoff tuning.
    pub retry: RetryPolicy,
    /// Per-host circuit breaker tuning.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Dedup cache TTL/GC tuning.
    pub dedup: DedupConfig,
}

impl Orchestrator {
    /// Build an orchestrator from its external interfaces and tuning config.
    #[must_use]
    pub fn new(catalog: Arc<dyn ApiCatalog>, storage: Arc<dyn StorageProvider>, config: OrchestratorConfig) -> Self {
        let engine = HttpEngine::new(reqwest::Client::new(), config.http);
        let breakers = CircuitBreakerRegistry::new(config.circuit_breaker);
        Self {
            catalog,
            storage,
            events: Arc::new(NullEventSink),
            logger: Arc::new(TracingLogger),
            dedup: DedupCache::new(config.dedup),
            retry: RetryController::new(engine, breakers, config.retry),
            oauth: TokenManager::default(),
            ephemeral: DashMap::new(),
        }
    }

    /// Replace the default [`EventSink`].
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replace the default [`Logger`].
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Periodic maintenance hook: sweeps expired dedup entries. Intended to
    /// be called from a `tokio::time::interval` loop at
    /// `config.dedup.gc_interval`.
    pub fn sweep_dedup_cache(&self) {
        self.dedup.sweep();
    }

    /// Look up a previously persisted result from the ephemeral fallback
    /// store. Only ever populated when [`StorageProvider::save_result`]
    /// failed for a successful action (spec §7/§4.8 P8).
    #[must_use]
    pub fn ephemeral_result(&self, execution_id: &ExecutionId, action_id: &ActionId) -> Option<ActionExecutionState> {
        self.ephemeral.get(&(execution_id.clone(), action_id.clone())).map(|e| e.clone())
    }

    /// Record that an action was skipped because an upstream dependency did
    /// not succeed. Exposed for [`crate::batch::run_batch`], which decides
    /// skip-vs-run per action before either path reaches here.
    pub(crate) async fn emit_skipped(&self, ctx: &ExecutionContext, action_id: &ActionId) {
        self.events
            .emit(ExecutionEvent::ActionSkipped { execution_id: ctx.execution_id.clone(), action_id: action_id.clone() })
            .await;
    }

    /// Run the full pipeline for one planned action. Callers running a
    /// batch of actions are responsible for topological ordering and for
    /// populating `ctx.previous_results` with every dependency's output
    /// before calling this (see [`crate::batch::run_batch`]).
    pub async fn execute_action(&self, ctx: &ExecutionContext, planned: &PlannedAction) -> ActionExecutionState {
        self.events
            .emit(ExecutionEvent::ActionStarted { execution_id: ctx.execution_id.clone(), action_id: planned.id.clone() })
            .await;

        let mut state = ActionExecutionState::pending(ctx.execution_id.clone(), planned.id.clone());
        state.status = ActionStatus::Running;

        let Some(entry) = self.catalog.get(&planned.action_definition_id).await else {
            let error = ErrorDetail::state_inconsistent(format!(
                "no action definition registered for `{}`",
                planned.action_definition_id
            ));
            return self.finish_failed(ctx, planned, state, error).await;
        };
        let definition = &entry.definition;

        let resolved_inputs = match axon_resolver::resolve_inputs(&planned.inputs, &planned.dependencies, &ctx.previous_results) {
            Ok(resolved) => resolved,
            Err(error) => return self.finish_failed(ctx, planned, state, error).await,
        };
        let inputs_value = Value::Object(resolved_inputs.into_iter().collect());

        let input_outcome = axon_schema::validate(&definition.input_schema, &inputs_value);
        if !input_outcome.valid {
            let error = ErrorDetail::validation_failed(format!(
                "input validation failed: {}",
                summarize(&input_outcome.errors)
            ));
            return self.finish_failed(ctx, planned, state, error).await;
        }

        let dependency_strings = planned.dependencies.iter().map(ActionId::to_string).collect();
        let dedup_key = axon_dedup::compute_key(definition.id.as_str(), &inputs_value, &dependency_strings);

        match self.dedup.acquire(&dedup_key).await {
            Admission::Follow(DedupOutcome::Completed(value)) => {
                state.result = Some(value);
                return self.finish_succeeded(ctx, planned, state).await;
            }
            Admission::Follow(DedupOutcome::Failed(error)) => {
                return self.finish_failed(ctx, planned, state, error).await;
            }
            Admission::Lead => {}
        }

        let request = match self.build_request(&entry, &inputs_value).await {
            Ok(request) => request,
            Err(error) => {
                self.dedup.fail(&dedup_key, error.clone());
                return self.finish_failed(ctx, planned, state, error).await;
            }
        };

        let (outcome, traces) = self.retry.execute_with_policy(&request, &definition.retry_policy).await;
        state.attempt_history_len = traces.len() as u32;
        state.trace = traces;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                let error = apply_catalog_error_mapping(&entry, error);
                self.dedup.fail(&dedup_key, error.clone());
                return self.finish_failed(ctx, planned, state, error).await;
            }
        };

        let output_value = match parse_body(&response) {
            Ok(value) => value,
            Err(error) => {
                self.dedup.fail(&dedup_key, error.clone());
                return self.finish_failed(ctx, planned, state, error).await;
            }
        };

        if entry.quirks.success_with_error_body {
            if let Some(error_payload) = output_value.as_object().and_then(|o| o.get("error")) {
                let message = error_payload.as_str().map(str::to_string).unwrap_or_else(|| error_payload.to_string());
                let error = ErrorDetail::new(ErrorCategory::ApiUnexpectedStatus, message, false)
                    .with_status_code(response.status)
                    .with_context("subtype", "success_with_error_body");
                self.dedup.fail(&dedup_key, error.clone());
                state.partial_output = Some(output_value);
                return self.finish_failed(ctx, planned, state, error).await;
            }
        }

        if let Some(output_schema) = &definition.output_schema {
            let output_outcome = axon_schema::validate(output_schema, &output_value);
            if !output_outcome.valid {
                let error = ErrorDetail::validation_failed(format!(
                    "output validation failed: {}",
                    summarize(&output_outcome.errors)
                ));
                self.dedup.fail(&dedup_key, error.clone());
                state.partial_output = Some(output_value);
                return self.finish_failed(ctx, planned, state, error).await;
            }
        }

        self.dedup.complete(&dedup_key, output_value.clone());
        state.result = Some(output_value);
        self.finish_succeeded(ctx, planned, state).await
    }

    async fn build_request(&self, entry: &ApiCatalogEntry, inputs: &Value) -> Result<OutboundRequest, ErrorDetail> {
        let definition = &entry.definition;
        let mut headers: Vec<(String, String)> = definition.endpoint.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

        let body = if definition.endpoint.method.eq_ignore_ascii_case("GET") {
            None
        } else {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            Some(serde_json::to_vec(inputs).map_err(|e| {
                ErrorDetail::validation_failed(format!("failed to serialize request body: {e}"))
            })?)
        };

        if let Some(user_agent) = &entry.quirks.requires_user_agent {
            headers.push(("User-Agent".to_string(), user_agent.clone()));
        }

        self.apply_authentication(&definition.authentication, &mut headers).await?;

        Ok(OutboundRequest { method: definition.endpoint.method.clone(), url: definition.endpoint.url.clone(), headers, body })
    }

    async fn apply_authentication(&self, auth: &AuthenticationConfig, headers: &mut Vec<(String, String)>) -> Result<(), ErrorDetail> {
        match auth {
            AuthenticationConfig::None => {}
            AuthenticationConfig::Bearer { token } => {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
            AuthenticationConfig::ApiKey { header, value } => {
                headers.push((header.clone(), value.clone()));
            }
            AuthenticationConfig::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                headers.push(("Authorization".to_string(), format!("Basic {encoded}")));
            }
            AuthenticationConfig::OAuth2 { token_url, client_id, client_secret, refresh_token, scope } => {
                let mut config = OAuthConfig::new(token_url.clone(), client_id.clone(), client_secret.clone(), refresh_token.clone());
                if let Some(scope) = scope {
                    config = config.with_scope(scope.clone());
                }
                let token = self.oauth.get_token(&config).await?;
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
        }
        Ok(())
    }

    async fn finish_succeeded(&self, ctx: &ExecutionContext, planned: &PlannedAction, mut state: ActionExecutionState) -> ActionExecutionState {
        state.status = ActionStatus::Succeeded;
        self.persist(ctx, planned, &mut state).await;
        self.events
            .emit(ExecutionEvent::ActionSucceeded { execution_id: ctx.execution_id.clone(), action_id: planned.id.clone() })
            .await;
        state
    }

    async fn finish_failed(&self, ctx: &ExecutionContext, planned: &PlannedAction, mut state: ActionExecutionState, error: ErrorDetail) -> ActionExecutionState {
        state.status = ActionStatus::Failed;
        state.error = Some(error.clone());
        self.persist(ctx, planned, &mut state).await;
        self.events
            .emit(ExecutionEvent::ActionFailed { execution_id: ctx.execution_id.clone(), action_id: planned.id.clone(), error })
            .await;
        state
    }

    /// Persist `state`. A `save_result` failure never invalidates a
    /// successful execution (spec §4.8 P8): the action still ends up
    /// reported as `Succeeded`/`Failed` per its actual outcome, just with
    /// `output_location` pointing at the ephemeral fallback instead of the
    /// primary store.
    async fn persist(&self, ctx: &ExecutionContext, planned: &PlannedAction, state: &mut ActionExecutionState) {
        match self.storage.save_result(state).await {
            Ok(()) => {
                if state.status == ActionStatus::Succeeded {
                    state.output_location = Some(OutputLocation {
                        provider: "primary".to_string(),
                        path: format!("result://{}/{}", ctx.execution_id, planned.id),
                        storage_failure: false,
                        storage_error_retryable: false,
                    });
                }
            }
            Err(storage_error) => {
                self.logger.warn(&format!(
                    "storage save_result failed for action `{}`, falling back to ephemeral storage: {storage_error}",
                    planned.id
                ));
                state.output_location = Some(OutputLocation {
                    provider: "ephemeral".to_string(),
                    path: "memory://transient".to_string(),
                    storage_failure: true,
                    storage_error_retryable: storage_error.retryable,
                });
                self.ephemeral.insert((ctx.execution_id.clone(), planned.id.clone()), state.clone());
            }
        }
    }
}

/// Replace a retry-exhausted error's category with a catalog-declared
/// override for its HTTP status, if one exists (spec §6 point 2). Falls
/// through unchanged for transport-level failures, which have no status
/// code to match against.
fn apply_catalog_error_mapping(entry: &ApiCatalogEntry, error: ErrorDetail) -> ErrorDetail {
    let Some(status) = error.status_code else { return error };
    let Some(mapping) = entry.error_mappings.iter().find(|m| m.status == status) else { return error };

    let mut mapped = ErrorDetail::new(mapping.category, error.message, mapping.retryable).with_status_code(status);
    if let Some(code) = error.code {
        mapped = mapped.with_code(code);
    }
    mapped.context = error.context;
    mapped.retry_after = error.retry_after;
    mapped.suggestion = error.suggestion;
    mapped
}

fn parse_body(response: &HttpResponse) -> Result<Value, ErrorDetail> {
    if response.body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body)
        .map_err(|e| axon_categorizer::categorize_malformed_response(response.status, e.to_string()))
}

fn summarize(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| format!("{}: {}", e.path, e.message)).collect::<Vec<_>>().join("; ")
}
