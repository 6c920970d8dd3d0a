//! The parameter bundle passed to every task invocation (spec §3).

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use skein_context::TypedContext;
use skein_core::{BreakpointId, TaskName, WorkflowId};
use skein_error::EngineError;
use skein_eventbus::EventBus;
use skein_execution::{Breakpoint, ExecutionContext};
use skein_persistence::PersistenceLayer;
use tokio_util::sync::CancellationToken;

use crate::config::WorkflowConfig;
use crate::route::RouteTarget;
use crate::snapshot::build_snapshot;

/// Everything a task's `execute` is given: its input `data`, handles onto
/// the workflow's shared state, the effective configuration, a
/// cancellation token, and the three imperative escapes (`redirect_to`,
/// `interrupt`, `abort`).
#[derive(Clone)]
pub struct TaskParams {
    pub data: Value,
    pub execution: Arc<ExecutionContext>,
    pub context: Arc<TypedContext>,
    pub events: Arc<EventBus>,
    pub config: WorkflowConfig,
    pub signal: CancellationToken,

    pub(crate) task_name: TaskName,
    pub(crate) workflow_id: WorkflowId,
    pub(crate) persistence: Arc<dyn PersistenceLayer>,
    pub(crate) redirect: Arc<Mutex<Option<RouteTarget>>>,
}

impl TaskParams {
    /// Imperatively override the router for this invocation. Takes
    /// priority over both the return value's `next` and the registered
    /// router (spec §9's resolution order).
    pub fn redirect_to(&self, next: RouteTarget) {
        *self.redirect.lock() = Some(next);
    }

    /// Pause the workflow: mark this task complete with `data`, record a
    /// durable breakpoint, persist synchronously, and return the sentinel
    /// error the attempt loop unwinds on. Callers return this directly:
    /// `return Err(params.interrupt(data).await);`
    pub async fn interrupt(&self, data: Value) -> EngineError {
        let id = BreakpointId::v4();
        self.execution.mark_task_complete(&self.task_name, data.clone());
        self.execution.set_breakpoint(Breakpoint {
            id,
            task: self.task_name.clone(),
            data,
        });

        let snapshot = build_snapshot(&self.execution, &self.context, &self.events, self.config, Utc::now());
        let _ = self.persistence.save(self.workflow_id, snapshot).await;

        EngineError::Breakpoint {
            task: self.task_name.clone(),
            breakpoint_id: id,
        }
    }

    /// Stop the workflow. `graceful = true` lets in-flight tasks finish;
    /// `graceful = false` additionally cancels the shared signal so
    /// subsidiary IO fails fast.
    pub fn abort(&self, graceful: bool) {
        self.execution.abort_workflow(graceful);
        if !graceful {
            self.signal.cancel();
        }
    }
}

#[cfg(feature = "test-util")]
impl TaskParams {
    /// Builds a `TaskParams` outside of `WorkflowEngine::start`, for task
    /// bodies in other crates to exercise in isolation. Not part of the
    /// engine's own execution path.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn for_test(
        data: Value,
        execution: Arc<ExecutionContext>,
        context: Arc<TypedContext>,
        events: Arc<EventBus>,
        config: WorkflowConfig,
        signal: CancellationToken,
        task_name: TaskName,
        workflow_id: WorkflowId,
        persistence: Arc<dyn PersistenceLayer>,
    ) -> Self {
        Self {
            data,
            execution,
            context,
            events,
            config,
            signal,
            task_name,
            workflow_id,
            persistence,
            redirect: Arc::new(Mutex::new(None)),
        }
    }
}
