//! End-to-end pipeline scenarios, one per numbered case in the executor
//! specification's worked-examples section.

mod support;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use axon_core::{ActionDefinitionId, ActionId, ExecutionId};
use axon_orchestrator::{
    ActionDefinition, ActionStatus, AuthenticationConfig, Endpoint, ExecutionContext, Orchestrator, OrchestratorConfig, PlannedAction,
};
use axon_schema::Schema;
use support::{FailingStorage, FakeCatalog, InMemoryStorage, RecordingEventSink};

fn open_schema() -> Schema {
    Schema::new(json!({"type": "object"}))
}

fn definition(id: &str, method: &str, url: &str, auth: AuthenticationConfig) -> ActionDefinition {
    definition_with_retry(id, method, url, auth, axon_http::RetryPolicy::default())
}

fn definition_with_retry(
    id: &str,
    method: &str,
    url: &str,
    auth: AuthenticationConfig,
    retry_policy: axon_http::RetryPolicy,
) -> ActionDefinition {
    ActionDefinition {
        id: ActionDefinitionId::new(id),
        description: String::new(),
        tags: Vec::new(),
        endpoint: Endpoint { method: method.to_string(), url: url.to_string(), headers: Default::default() },
        authentication: auth,
        input_schema: open_schema(),
        output_schema: None,
        retry_policy,
    }
}

fn planned(id: &str, definition_id: &str, inputs: serde_json::Value, dependencies: &[&str]) -> PlannedAction {
    PlannedAction {
        id: ActionId::new(id),
        action_definition_id: ActionDefinitionId::new(definition_id),
        inputs: inputs.as_object().cloned().unwrap_or_default().into_iter().collect(),
        dependencies: dependencies.iter().map(|d| ActionId::new(*d)).collect(),
    }
}

/// Scenario 1: an action's input references a prior action's output and
/// resolves successfully before the call is made.
#[tokio::test]
async fn scenario_reference_resolution_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 42, "name": "Ada"})))
        .mount(&server)
        .await;

    let catalog = Arc::new(FakeCatalog::default());
    catalog.register(definition("fetch-user", "GET", &format!("{}/users/42", server.uri()), AuthenticationConfig::None));

    let orchestrator = Orchestrator::new(catalog, Arc::new(InMemoryStorage::default()), OrchestratorConfig::default());

    let mut ctx = ExecutionContext::new(ExecutionId::v4());
    ctx.previous_results.insert(ActionId::new("lookup"), json!({"userId": 42}));

    let action = planned("fetch", "fetch-user", json!({"id": "${lookup.userId}"}), &["lookup"]);
    let state = orchestrator.execute_action(&ctx, &action).await;

    assert_eq!(state.status, ActionStatus::Succeeded);
    assert_eq!(state.result, Some(json!({"id": 42, "name": "Ada"})));
}

/// Scenario 2: a circular reference within a batch fails every action in
/// the batch before any HTTP call is attempted.
#[tokio::test]
async fn scenario_circular_reference_fails_whole_batch() {
    let catalog = Arc::new(FakeCatalog::default());
    catalog.register(definition("noop", "GET", "http://unused.invalid/", AuthenticationConfig::None));

    let orchestrator = Orchestrator::new(catalog, Arc::new(InMemoryStorage::default()), OrchestratorConfig::default());
    let mut ctx = ExecutionContext::new(ExecutionId::v4());

    let a = planned("a", "noop", json!({"x": "${b.x}"}), &["b"]);
    let b = planned("b", "noop", json!({"x": "${a.x}"}), &["a"]);

    let result = axon_orchestrator::run_batch(&orchestrator, &mut ctx, &[a, b]).await;

    assert_eq!(result.states.len(), 2);
    for state in result.states.values() {
        assert_eq!(state.status, ActionStatus::Failed);
        assert!(state.error.as_ref().unwrap().message.contains("circular"));
    }
}

/// Scenario: identical concurrent calls to the same action deduplicate into
/// a single outbound HTTP request.
#[tokio::test]
async fn scenario_duplicate_calls_share_one_http_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/charge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let catalog = Arc::new(FakeCatalog::default());
    catalog.register(definition("charge", "POST", &format!("{}/charge", server.uri()), AuthenticationConfig::None));

    let orchestrator = Arc::new(Orchestrator::new(catalog, Arc::new(InMemoryStorage::default()), OrchestratorConfig::default()));
    let ctx = Arc::new(ExecutionContext::new(ExecutionId::v4()));

    let action = Arc::new(planned("charge-1", "charge", json!({"amount": 500}), &[]));

    let (first, second) = tokio::join!(
        orchestrator.execute_action(&ctx, &action),
        orchestrator.execute_action(&ctx, &action),
    );

    assert_eq!(first.status, ActionStatus::Succeeded);
    assert_eq!(second.status, ActionStatus::Succeeded);
    assert_eq!(first.result, second.result);
}

/// A storage failure on an otherwise-successful action does not turn the
/// action's own status into a failure; the result lands in ephemeral
/// storage instead.
#[tokio::test]
async fn storage_failure_does_not_invalidate_a_successful_action() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": true})))
        .mount(&server)
        .await;

    let catalog = Arc::new(FakeCatalog::default());
    catalog.register(definition("ping", "GET", &format!("{}/ping", server.uri()), AuthenticationConfig::None));

    let orchestrator = Orchestrator::new(catalog, Arc::new(FailingStorage), OrchestratorConfig::default());
    let ctx = ExecutionContext::new(ExecutionId::v4());
    let action = planned("ping-1", "ping", json!({}), &[]);

    let state = orchestrator.execute_action(&ctx, &action).await;

    assert_eq!(state.status, ActionStatus::Succeeded);
    let fallback = orchestrator.ephemeral_result(&ctx.execution_id, &action.id).expect("ephemeral fallback populated");
    assert_eq!(fallback.status, ActionStatus::Succeeded);
}

/// A dependency that fails causes downstream actions to be skipped rather
/// than attempted, and a skip event is emitted for each.
#[tokio::test]
async fn dependent_action_is_skipped_when_upstream_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fails"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let catalog = Arc::new(FakeCatalog::default());
    catalog.register(definition_with_retry(
        "flaky",
        "GET",
        &format!("{}/fails", server.uri()),
        AuthenticationConfig::None,
        axon_http::RetryPolicy { max_attempts: 1, ..Default::default() },
    ));
    catalog.register(definition("noop", "GET", "http://unused.invalid/", AuthenticationConfig::None));

    let events = Arc::new(RecordingEventSink::default());
    let orchestrator =
        Orchestrator::new(catalog, Arc::new(InMemoryStorage::default()), OrchestratorConfig::default()).with_events(events.clone());

    let mut ctx = ExecutionContext::new(ExecutionId::v4());
    let upstream = planned("upstream", "flaky", json!({}), &[]);
    let downstream = planned("downstream", "noop", json!({}), &["upstream"]);

    let result = axon_orchestrator::run_batch(&orchestrator, &mut ctx, &[upstream, downstream]).await;

    assert_eq!(result.states[&ActionId::new("upstream")].status, ActionStatus::Failed);
    assert_eq!(result.states[&ActionId::new("downstream")].status, ActionStatus::Skipped);

    let skipped = events.events().into_iter().any(|e| matches!(e, axon_orchestrator::ExecutionEvent::ActionSkipped { .. }));
    assert!(skipped, "expected an ActionSkipped event for the downstream action");
}

/// Bearer authentication is applied as an `Authorization` header on the
/// outbound request.
#[tokio::test]
async fn bearer_authentication_header_is_applied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secure"))
        .and(wiremock::matchers::header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let catalog = Arc::new(FakeCatalog::default());
    catalog.register(definition(
        "secure",
        "GET",
        &format!("{}/secure", server.uri()),
        AuthenticationConfig::Bearer { token: "secret-token".to_string() },
    ));

    let orchestrator = Orchestrator::new(catalog, Arc::new(InMemoryStorage::default()), OrchestratorConfig::default());
    let ctx = ExecutionContext::new(ExecutionId::v4());
    let action = planned("secure-1", "secure", json!({}), &[]);

    let state = orchestrator.execute_action(&ctx, &action).await;
    assert_eq!(state.status, ActionStatus::Succeeded);
}
