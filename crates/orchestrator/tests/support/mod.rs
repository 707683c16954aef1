//! In-memory fakes for the orchestrator's external interfaces, used across
//! the integration test scenarios.

use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use axon_core::{ActionDefinitionId, ActionId, ErrorDetail, ExecutionId};
use axon_orchestrator::{ActionDefinition, ActionExecutionState, ApiCatalog, ApiCatalogEntry, EventSink, ExecutionEvent, StorageProvider};

/// A catalog backed by a plain map, populated up front by each test.
#[derive(Default)]
pub struct FakeCatalog {
    entries: DashMap<ActionDefinitionId, ApiCatalogEntry>,
}

impl FakeCatalog {
    pub fn register(&self, definition: ActionDefinition) {
        self.entries.insert(
            definition.id.clone(),
            ApiCatalogEntry { definition, error_mappings: Vec::new(), rate_limiting: Default::default(), quirks: Default::default() },
        );
    }

    pub fn register_entry(&self, entry: ApiCatalogEntry) {
        self.entries.insert(entry.definition.id.clone(), entry);
    }
}

#[async_trait]
impl ApiCatalog for FakeCatalog {
    async fn get(&self, id: &ActionDefinitionId) -> Option<ApiCatalogEntry> {
        self.entries.get(id).map(|e| e.clone())
    }
}

/// Storage that always succeeds, keeping everything in memory.
#[derive(Default)]
pub struct InMemoryStorage {
    records: DashMap<(ExecutionId, ActionId), ActionExecutionState>,
}

#[async_trait]
impl StorageProvider for InMemoryStorage {
    async fn save_result(&self, state: &ActionExecutionState) -> Result<(), ErrorDetail> {
        self.records.insert((state.execution_id.clone(), state.action_id.clone()), state.clone());
        Ok(())
    }

    async fn load_result(&self, execution_id: &ExecutionId, action_id: &ActionId) -> Result<Option<ActionExecutionState>, ErrorDetail> {
        Ok(self.records.get(&(execution_id.clone(), action_id.clone())).map(|r| r.clone()))
    }
}

/// Storage that always fails, to exercise the ephemeral fallback path.
#[derive(Default)]
pub struct FailingStorage;

#[async_trait]
impl StorageProvider for FailingStorage {
    async fn save_result(&self, _state: &ActionExecutionState) -> Result<(), ErrorDetail> {
        Err(ErrorDetail::state_inconsistent("storage backend unreachable"))
    }

    async fn load_result(&self, _execution_id: &ExecutionId, _action_id: &ActionId) -> Result<Option<ActionExecutionState>, ErrorDetail> {
        Err(ErrorDetail::state_inconsistent("storage backend unreachable"))
    }
}

/// An event sink that records every event it receives, for assertions.
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().expect("event sink mutex poisoned").clone()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: ExecutionEvent) {
        self.events.lock().expect("event sink mutex poisoned").push(event);
    }
}
