//! # skein-persistence
//!
//! The `PersistenceLayer` capability the workflow engine consumes to
//! durably save/load a workflow run (spec §4.6, §6's persistence schema),
//! plus the `{type: "Set"|"Map", value: ...}` serialization envelope that
//! lets in-memory `HashSet`/`HashMap` state round-trip through JSON without
//! losing its shape — required for backward compatibility with any
//! already-persisted data (spec §9).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use skein_core::WorkflowId;

/// Errors from a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The backend failed to serialize or deserialize a snapshot.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend itself failed (IO, network, etc).
    #[error("backend error: {0}")]
    Backend(String),
}

/// A durable snapshot of one workflow run, matching spec §6's persistence
/// schema. Each state field is stored pre-encoded as JSON by the layer
/// that owns it (execution state, event bus state, typed context state) so
/// this crate never needs to depend on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    /// Encoded `ExecutionContext` state (completed/running sets, task data,
    /// execution counts, timings, abort flags, breakpoint).
    pub workflow_state: Value,
    /// Encoded `EventBus::get_all_state()`.
    pub event_state: Value,
    /// Encoded `TypedContext::snapshot()`.
    pub context_state: Value,
    /// Per-task execution counts, `{type: "Map", value: {...}}`-encoded.
    pub execution_counts: Value,
    /// Per-task timing records.
    pub task_timings: Value,
    /// The workflow configuration in effect when this snapshot was taken.
    pub workflow_config: Value,
    /// When this snapshot was written.
    pub last_updated: DateTime<Utc>,
}

/// Capability required by the workflow engine to persist and resume runs.
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Durably write `snapshot` under `workflow_id`, replacing any prior
    /// snapshot.
    async fn save(&self, workflow_id: WorkflowId, snapshot: WorkflowSnapshot) -> Result<(), PersistenceError>;

    /// Load the last snapshot saved for `workflow_id`, or `None` if there
    /// is none.
    async fn load(&self, workflow_id: WorkflowId) -> Result<Option<WorkflowSnapshot>, PersistenceError>;
}

/// An in-memory [`PersistenceLayer`], useful for tests and for embedding
/// the engine in a process that doesn't need cross-restart durability.
#[derive(Default)]
pub struct InMemoryPersistence {
    snapshots: DashMap<WorkflowId, WorkflowSnapshot>,
}

impl InMemoryPersistence {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceLayer for InMemoryPersistence {
    async fn save(&self, workflow_id: WorkflowId, snapshot: WorkflowSnapshot) -> Result<(), PersistenceError> {
        self.snapshots.insert(workflow_id, snapshot);
        Ok(())
    }

    async fn load(&self, workflow_id: WorkflowId) -> Result<Option<WorkflowSnapshot>, PersistenceError> {
        Ok(self.snapshots.get(&workflow_id).map(|entry| entry.clone()))
    }
}

/// Encode a set of serializable items as `{type: "Set", value: [...]}`.
pub fn encode_set<T, I>(items: I) -> Value
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let values: Vec<Value> = items
        .into_iter()
        .map(|item| serde_json::to_value(item).expect("set item must serialize"))
        .collect();
    serde_json::json!({ "type": "Set", "value": values })
}

/// Decode a `{type: "Set", value: [...]}` envelope back into a `Vec<T>`
/// (callers typically collect this into a `HashSet`/`BTreeSet`).
pub fn decode_set<T: DeserializeOwned>(value: &Value) -> Result<Vec<T>, PersistenceError> {
    let array = value
        .get("value")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    Ok(serde_json::from_value(array)?)
}

/// Encode a string-keyed map as `{type: "Map", value: {...}}`.
pub fn encode_map<V: Serialize>(map: &HashMap<String, V>) -> Value {
    serde_json::json!({ "type": "Map", "value": map })
}

/// Decode a `{type: "Map", value: {...}}` envelope back into a
/// `HashMap<String, V>`.
pub fn decode_map<V: DeserializeOwned>(value: &Value) -> Result<HashMap<String, V>, PersistenceError> {
    let object = value
        .get("value")
        .cloned()
        .unwrap_or(Value::Object(serde_json::Map::new()));
    Ok(serde_json::from_value(object)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn encode_set_uses_type_envelope() {
        let value = encode_set(["a".to_string(), "b".to_string()]);
        assert_eq!(value["type"], "Set");
        assert!(value["value"].is_array());
    }

    #[test]
    fn set_round_trips_through_envelope() {
        let original: HashSet<String> = ["x".to_string(), "y".to_string(), "z".to_string()]
            .into_iter()
            .collect();
        let encoded = encode_set(original.clone());
        let decoded: HashSet<String> = decode_set::<String>(&encoded).unwrap().into_iter().collect();
        assert_eq!(decoded, original);
    }

    #[test]
    fn map_round_trips_through_envelope() {
        let mut original = HashMap::new();
        original.insert("writer".to_string(), 3u32);
        original.insert("planning".to_string(), 1u32);

        let encoded = encode_map(&original);
        assert_eq!(encoded["type"], "Map");
        let decoded: HashMap<String, u32> = decode_map(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_set_missing_value_field_is_empty() {
        let decoded: Vec<String> = decode_set(&serde_json::json!({"type": "Set"})).unwrap();
        assert!(decoded.is_empty());
    }

    #[tokio::test]
    async fn in_memory_persistence_save_then_load() {
        let store = InMemoryPersistence::new();
        let workflow_id = WorkflowId::v4();
        let snapshot = WorkflowSnapshot {
            workflow_state: serde_json::json!({"aborted": false}),
            event_state: serde_json::json!({}),
            context_state: serde_json::json!({}),
            execution_counts: encode_map(&HashMap::<String, u32>::new()),
            task_timings: serde_json::json!({}),
            workflow_config: serde_json::json!({"maxRetries": 3}),
            last_updated: Utc::now(),
        };

        store.save(workflow_id, snapshot.clone()).await.unwrap();
        let loaded = store.load(workflow_id).await.unwrap().unwrap();
        assert_eq!(loaded.workflow_state, snapshot.workflow_state);
        assert_eq!(loaded.workflow_config, snapshot.workflow_config);
    }

    #[tokio::test]
    async fn in_memory_persistence_load_missing_is_none() {
        let store = InMemoryPersistence::new();
        let loaded = store.load(WorkflowId::v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let store = InMemoryPersistence::new();
        let workflow_id = WorkflowId::v4();
        let make_snapshot = |marker: &str| WorkflowSnapshot {
            workflow_state: serde_json::json!({ "marker": marker }),
            event_state: serde_json::json!({}),
            context_state: serde_json::json!({}),
            execution_counts: serde_json::json!({}),
            task_timings: serde_json::json!({}),
            workflow_config: serde_json::json!({}),
            last_updated: Utc::now(),
        };

        store.save(workflow_id, make_snapshot("first")).await.unwrap();
        store.save(workflow_id, make_snapshot("second")).await.unwrap();

        let loaded = store.load(workflow_id).await.unwrap().unwrap();
        assert_eq!(loaded.workflow_state["marker"], "second");
    }
}
