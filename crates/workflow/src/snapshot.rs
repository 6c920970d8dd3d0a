//! Builds the durable [`WorkflowSnapshot`] from a run's live state (spec §6's
//! persistence schema).

use chrono::{DateTime, Utc};
use serde_json::Value;
use skein_context::TypedContext;
use skein_eventbus::EventBus;
use skein_execution::ExecutionContext;
use skein_persistence::WorkflowSnapshot;

use crate::config::WorkflowConfig;

/// Assemble a snapshot from the three pieces of live state owned by one
/// workflow run, duplicating `executionCounts`/`taskTimings` at the top
/// level as the persistence schema names them, even though they are also
/// nested inside `workflow_state`.
pub fn build_snapshot(
    execution: &ExecutionContext,
    context: &TypedContext,
    events: &EventBus,
    config: WorkflowConfig,
    now: DateTime<Utc>,
) -> WorkflowSnapshot {
    let workflow_state = execution.snapshot();
    let execution_counts = workflow_state
        .get("executionCounts")
        .cloned()
        .unwrap_or(Value::Null);
    let task_timings = workflow_state.get("timings").cloned().unwrap_or(Value::Null);

    WorkflowSnapshot {
        workflow_state,
        event_state: Value::Object(events.get_all_state()),
        context_state: Value::Object(context.snapshot()),
        execution_counts,
        task_timings,
        workflow_config: config.to_value(),
        last_updated: now,
    }
}
