//! The task scheduler itself: registration, `start`, the `executeTask`
//! attempt loop, breakpoints, resume, and abort (spec §4.5).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use skein_context::TypedContext;
use skein_core::{BreakpointId, TaskName, WorkflowId};
use skein_error::EngineError;
use skein_eventbus::EventBus;
use skein_execution::ExecutionContext;
use skein_persistence::PersistenceLayer;
use skein_resilience::BackoffPolicy;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::params::TaskParams;
use crate::route::{ParallelDestination, RouteTarget};
use crate::snapshot::build_snapshot;
use crate::task::TaskDefinition;

/// The live state of one workflow run: its identity plus the three shared
/// stores a registered task can observe and mutate. Cheap to construct;
/// owned by the caller of [`WorkflowEngine::start`]/[`WorkflowEngine::resume`].
#[derive(Clone)]
pub struct WorkflowRun {
    pub workflow_id: WorkflowId,
    pub execution: Arc<ExecutionContext>,
    pub context: Arc<TypedContext>,
    pub events: Arc<EventBus>,
    pub signal: CancellationToken,
}

impl WorkflowRun {
    /// Start a fresh run with empty state, scoped to one workflow instance
    /// (spec §9: "scope one bus per workflow instance to avoid cross-workflow
    /// leakage").
    #[must_use]
    pub fn new(workflow_id: WorkflowId) -> Self {
        let events = Arc::new(EventBus::new());
        Self {
            workflow_id,
            execution: Arc::new(ExecutionContext::new(events.clone())),
            context: Arc::new(TypedContext::new()),
            events,
            signal: CancellationToken::new(),
        }
    }
}

/// Task registry plus scheduler. One engine can drive many concurrent
/// [`WorkflowRun`]s; all per-run mutable state lives on the run, not here.
pub struct WorkflowEngine {
    tasks: RwLock<HashMap<TaskName, TaskDefinition>>,
    persistence: Arc<dyn PersistenceLayer>,
    config: WorkflowConfig,
    backoff: BackoffPolicy,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(persistence: Arc<dyn PersistenceLayer>, config: WorkflowConfig) -> Self {
        let backoff = BackoffPolicy::new(config.retry_delay_ms, config.retry_delay_multiplier);
        Self {
            tasks: RwLock::new(HashMap::new()),
            persistence,
            config,
            backoff,
        }
    }

    /// Register a task, replacing any prior definition of the same name.
    pub fn task(&self, definition: TaskDefinition) -> &Self {
        self.tasks.write().insert(definition.name.clone(), definition);
        self
    }

    /// Whether a task of this name is currently registered.
    #[must_use]
    pub fn has_task(&self, name: &TaskName) -> bool {
        self.tasks.read().contains_key(name)
    }

    /// `start(initialTask, initialData)`: merge `initial_data` into the
    /// run's context if it is a JSON object, then invoke `initial_task`.
    pub async fn start(&self, run: &WorkflowRun, initial_task: TaskName, initial_data: Value) -> Result<(), EngineError> {
        if let Value::Object(map) = &initial_data {
            run.context.merge(map.clone());
        }
        self.execute_task(run, initial_task, initial_data).await
    }

    /// `resume(workflowId, breakpointId)`: reload the durable snapshot,
    /// restore execution/event/context state, and re-invoke the
    /// breakpointed task with its stored data.
    pub async fn resume(&self, run: &WorkflowRun, breakpoint_id: BreakpointId) -> Result<(), EngineError> {
        let snapshot = self
            .persistence
            .load(run.workflow_id)
            .await
            .map_err(|e| EngineError::execution_failed("resume", e))?
            .ok_or_else(|| EngineError::TaskNotFound {
                task: TaskName::new(format!("<no snapshot for {}>", run.workflow_id)),
            })?;

        run.execution
            .restore(&snapshot.workflow_state)
            .map_err(|e| EngineError::execution_failed("resume", e))?;
        if let Value::Object(obj) = snapshot.event_state {
            run.events.set_all_state(obj);
        }
        if let Value::Object(obj) = snapshot.context_state {
            run.context.restore(obj);
        }

        let breakpoint = run.execution.breakpoint().ok_or_else(|| EngineError::TaskNotFound {
            task: TaskName::new(format!("<no breakpoint {breakpoint_id}>")),
        })?;
        if breakpoint.id != breakpoint_id {
            return Err(EngineError::TaskNotFound {
                task: TaskName::new(format!("<breakpoint id mismatch: {breakpoint_id}>")),
            });
        }
        if !self.tasks.read().contains_key(&breakpoint.task) {
            return Err(EngineError::TaskNotFound { task: breakpoint.task });
        }

        run.execution.clear_breakpoint();
        self.execute_task(run, breakpoint.task.clone(), breakpoint.data.clone())
            .await
    }

    /// `abort(graceful)`: flip the run's flags and persist.
    pub async fn abort(&self, run: &WorkflowRun, graceful: bool) -> Result<(), EngineError> {
        run.execution.abort_workflow(graceful);
        if !graceful {
            run.signal.cancel();
        }
        self.persist(run).await
    }

    async fn persist(&self, run: &WorkflowRun) -> Result<(), EngineError> {
        let snapshot = build_snapshot(&run.execution, &run.context, &run.events, self.config, Utc::now());
        self.persistence
            .save(run.workflow_id, snapshot)
            .await
            .map_err(|e| EngineError::execution_failed("persist", e))
    }

    fn make_params(&self, run: &WorkflowRun, task_name: &TaskName, data: Value) -> TaskParams {
        TaskParams {
            data,
            execution: run.execution.clone(),
            context: run.context.clone(),
            events: run.events.clone(),
            config: self.config,
            signal: run.signal.clone(),
            task_name: task_name.clone(),
            workflow_id: run.workflow_id,
            persistence: self.persistence.clone(),
            redirect: Arc::new(Mutex::new(None)),
        }
    }

    /// The `executeTask` algorithm (spec §4.5). Boxed because it recurses
    /// across successor dispatch.
    pub fn execute_task<'a>(
        &'a self,
        run: &'a WorkflowRun,
        name: TaskName,
        data: Value,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(self.execute_task_inner(run, name, data))
    }

    async fn execute_task_inner(&self, run: &WorkflowRun, name: TaskName, data: Value) -> Result<(), EngineError> {
        // Step 1: aborted non-gracefully means no further tasks are scheduled.
        if run.execution.is_aborted() && !run.execution.is_graceful_shutdown() {
            return Ok(());
        }

        // Step 2: resolve config; missing task is fatal.
        let definition = {
            let tasks = self.tasks.read();
            tasks
                .get(&name)
                .cloned()
                .ok_or_else(|| EngineError::TaskNotFound { task: name.clone() })?
        };

        // Step 3: dependency gate. Defensive — dependencies are normally
        // satisfied by caller-arranged ordering.
        for dependency in &definition.dependencies {
            if !run.execution.is_task_complete(dependency) {
                return Ok(());
            }
        }

        // Step 4: already complete means this is a loop re-entry.
        if run.execution.is_task_complete(&name) {
            run.execution.reset_task_completion(&name);
        }

        // Step 5: re-entrancy guard.
        if run.execution.is_task_running(&name) {
            return Ok(());
        }

        // Step 6: mark running, start timing.
        run.execution.start_running(&name);
        let timeout_ms = definition.timeout_ms.unwrap_or(self.config.timeout_ms);

        let mut attempt: u32 = 0;
        let retry_count = definition.retry_count.unwrap_or(self.config.max_retries);
        let max_attempts = retry_count + 1;
        let outcome = loop {
            if attempt > 0 {
                tokio::time::sleep(self.backoff.delay_for_attempt_jittered(attempt)).await;
            }
            info!(task = %name, attempt, "running task");
            run.execution.start_task_timing(&name, Utc::now());

            let params = self.make_params(run, &name, data.clone());
            let redirect_slot = params.redirect.clone();
            let invocation = definition.execute.execute(params);
            let result = if timeout_ms == 0 {
                Err(EngineError::Timeout { task: name.clone(), timeout_ms })
            } else {
                match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), invocation).await {
                    Ok(inner) => inner,
                    Err(_elapsed) => Err(EngineError::Timeout { task: name.clone(), timeout_ms }),
                }
            };

            match result {
                Ok(task_outcome) => {
                    run.execution.end_task_timing(&name, Utc::now(), None);
                    break ResolvedOutcome {
                        result: task_outcome.result,
                        redirect: redirect_slot.lock().clone(),
                        next: task_outcome.next,
                    };
                }
                Err(EngineError::Breakpoint { task, breakpoint_id }) => {
                    run.execution.end_task_timing(&name, Utc::now(), Some("breakpoint".to_string()));
                    info!(task = %name, %breakpoint_id, "breakpoint reached");
                    return Err(EngineError::Breakpoint { task, breakpoint_id });
                }
                Err(error) => {
                    run.execution.end_task_timing(&name, Utc::now(), Some(error.to_string()));
                    attempt += 1;

                    if let Some(handler) = &definition.on_error {
                        let params = self.make_params(run, &name, data.clone());
                        match handler.handle(&error, &params).await {
                            Ok(handled) => {
                                if handled.retry && attempt < max_attempts {
                                    continue;
                                }
                                if let Some(result) = handled.result {
                                    break ResolvedOutcome {
                                        result,
                                        redirect: params.redirect.lock().clone(),
                                        next: handled.next,
                                    };
                                }
                            }
                            Err(handler_error) => {
                                let wrapped = EngineError::ErrorHandlerFailed {
                                    task: name.clone(),
                                    source: Box::new(handler_error),
                                };
                                warn!(task = %name, error = %wrapped, "error handler itself failed; rethrowing original error");
                                run.execution.fail_running(&name);
                                return Err(error);
                            }
                        }
                    }

                    if attempt >= max_attempts {
                        run.execution.fail_running(&name);
                        return Err(error);
                    }
                    // attempts remain and no handler resolved the error: retry.
                }
            }
        };

        // Step 7d: mark complete, persist.
        run.execution.mark_task_complete(&name, outcome.result.clone());
        self.persist(run).await?;

        // Both graceful and hard abort suppress successor dispatch at this
        // boundary (spec §5); only a hard abort also cancels in-flight IO.
        if run.execution.is_aborted() {
            return Ok(());
        }

        // Step 7e: resolve successors in priority order.
        let target = outcome
            .redirect
            .or(outcome.next)
            .unwrap_or_else(|| match &definition.route {
                Some(router) => {
                    let params = self.make_params(run, &name, outcome.result.clone());
                    router.route(&outcome.result, &params)
                }
                None => RouteTarget::Terminal,
            });

        self.dispatch(run, target, outcome.result).await
    }

    async fn dispatch(&self, run: &WorkflowRun, target: RouteTarget, predecessor_result: Value) -> Result<(), EngineError> {
        match target {
            RouteTarget::Terminal | RouteTarget::End => {
                self.persist(run).await?;
                Ok(())
            }
            RouteTarget::Next(next) => {
                self.execute_task(run, next, predecessor_result).await?;
                self.persist(run).await
            }
            RouteTarget::Parallel(destinations) => {
                self.dispatch_parallel(run, destinations, predecessor_result).await?;
                self.persist(run).await
            }
        }
    }

    async fn dispatch_parallel(
        &self,
        run: &WorkflowRun,
        destinations: Vec<ParallelDestination>,
        predecessor_result: Value,
    ) -> Result<(), EngineError> {
        let futures: Vec<BoxFuture<'_, Result<(), EngineError>>> = destinations
            .into_iter()
            .map(|destination| {
                let data = destination.data.unwrap_or_else(|| predecessor_result.clone());
                self.execute_task(run, destination.task, data)
            })
            .collect();

        let results = futures::future::join_all(futures).await;
        for result in results {
            result?;
        }
        Ok(())
    }
}

struct ResolvedOutcome {
    result: Value,
    redirect: Option<RouteTarget>,
    next: Option<RouteTarget>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{task_fn, TaskOutcome};
    use skein_persistence::InMemoryPersistence;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn engine() -> WorkflowEngine {
        WorkflowEngine::new(Arc::new(InMemoryPersistence::new()), WorkflowConfig::default())
    }

    #[tokio::test]
    async fn linear_chain_runs_in_order() {
        let eng = engine();
        eng.task(
            TaskDefinition::new(
                "a",
                task_fn(|p| async move { Ok(TaskOutcome::with_route(serde_json::json!("a-done"), RouteTarget::Next(TaskName::new("b")))) }),
            ),
        );
        eng.task(TaskDefinition::new("b", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) })));

        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("a"), Value::Null).await.unwrap();

        assert!(run.execution.is_task_complete(&TaskName::new("a")));
        assert!(run.execution.is_task_complete(&TaskName::new("b")));
        assert_eq!(run.execution.task_data(&TaskName::new("b")), Some(serde_json::json!("a-done")));
    }

    #[tokio::test]
    async fn missing_task_is_fatal() {
        let eng = engine();
        let run = WorkflowRun::new(WorkflowId::v4());
        let err = eng.start(&run, TaskName::new("ghost"), Value::Null).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn dependency_gate_silently_skips() {
        let eng = engine();
        eng.task(
            TaskDefinition::new("gated", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) }))
                .dependencies([TaskName::new("prereq")]),
        );
        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("gated"), Value::Null).await.unwrap();
        assert!(!run.execution.is_task_complete(&TaskName::new("gated")));
    }

    #[tokio::test]
    async fn retry_count_zero_yields_exactly_one_attempt() {
        let eng = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts2 = attempts.clone();
        eng.task(TaskDefinition::new(
            "flaky",
            task_fn(move |_p| {
                let attempts = attempts2.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(EngineError::execution_failed("flaky", std::io::Error::other("boom")))
                }
            }),
        ));
        let run = WorkflowRun::new(WorkflowId::v4());
        let err = eng.start(&run, TaskName::new("flaky"), Value::Null).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskExecutionFailed { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!run.execution.is_task_running(&TaskName::new("flaky")));
    }

    #[tokio::test]
    async fn task_without_its_own_retry_count_inherits_config_max_retries() {
        let config = WorkflowConfig { max_retries: 2, ..WorkflowConfig::default() };
        let eng = WorkflowEngine::new(Arc::new(InMemoryPersistence::new()), config);
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts2 = attempts.clone();
        eng.task(TaskDefinition::new(
            "flaky",
            task_fn(move |_p| {
                let attempts = attempts2.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(EngineError::execution_failed("flaky", std::io::Error::other("boom")))
                    } else {
                        Ok(TaskOutcome::new(serde_json::json!("ok")))
                    }
                }
            }),
        ));
        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("flaky"), Value::Null).await.unwrap();

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(run.execution.task_data(&TaskName::new("flaky")), Some(serde_json::json!("ok")));
    }

    #[tokio::test]
    async fn retry_then_succeed_records_failed_then_success_timing() {
        let eng = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts2 = attempts.clone();
        eng.task(
            TaskDefinition::new(
                "f",
                task_fn(move |_p| {
                    let attempts = attempts2.clone();
                    async move {
                        let n = attempts.fetch_add(1, Ordering::SeqCst);
                        if n == 0 {
                            Err(EngineError::execution_failed("f", std::io::Error::other("first try fails")))
                        } else {
                            Ok(TaskOutcome::new(serde_json::json!("ok")))
                        }
                    }
                }),
            )
            .retry_count(2),
        );
        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("f"), Value::Null).await.unwrap();

        assert_eq!(run.execution.execution_count(&TaskName::new("f")), 1);
        let summary = run.execution.task_timing_summary();
        let f_summary = &summary[&TaskName::new("f")];
        assert_eq!(f_summary.attempts, 2);
        assert_eq!(f_summary.failures, 1);
        assert_eq!(run.execution.task_data(&TaskName::new("f")), Some(serde_json::json!("ok")));
    }

    #[tokio::test]
    async fn parallel_fan_out_with_per_route_data() {
        let eng = engine();
        eng.task(TaskDefinition::new(
            "start",
            task_fn(|_p| async move {
                Ok(TaskOutcome::with_route(
                    serde_json::json!("r"),
                    RouteTarget::Parallel(vec![
                        ParallelDestination { task: TaskName::new("x"), data: Some(serde_json::json!(1)) },
                        ParallelDestination { task: TaskName::new("y"), data: Some(serde_json::json!(2)) },
                    ]),
                ))
            }),
        ));
        eng.task(TaskDefinition::new("x", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) })));
        eng.task(TaskDefinition::new("y", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) })));

        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("start"), Value::Null).await.unwrap();

        assert_eq!(run.execution.task_data(&TaskName::new("x")), Some(serde_json::json!(1)));
        assert_eq!(run.execution.task_data(&TaskName::new("y")), Some(serde_json::json!(2)));
    }

    #[tokio::test]
    async fn router_end_halts_even_with_other_registered_tasks() {
        let eng = engine();
        eng.task(TaskDefinition::new(
            "a",
            task_fn(|_p| async move { Ok(TaskOutcome::with_route(serde_json::json!("x"), RouteTarget::End)) }),
        ));
        eng.task(TaskDefinition::new("elsewhere", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) })));

        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("a"), Value::Null).await.unwrap();
        assert!(!run.execution.is_task_complete(&TaskName::new("elsewhere")));
    }

    #[tokio::test]
    async fn cyclic_routing_requires_reset_to_reenter() {
        let eng = engine();
        let loops = Arc::new(AtomicU32::new(0));
        let loops2 = loops.clone();
        eng.task(TaskDefinition::new(
            "looped",
            task_fn(move |_p| {
                let loops = loops2.clone();
                async move {
                    let n = loops.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Ok(TaskOutcome::with_route(serde_json::json!(n), RouteTarget::Next(TaskName::new("looped"))))
                    } else {
                        Ok(TaskOutcome::new(serde_json::json!(n)))
                    }
                }
            }),
        ));
        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("looped"), Value::Null).await.unwrap();
        assert_eq!(run.execution.execution_count(&TaskName::new("looped")), 2);
    }

    #[tokio::test]
    async fn breakpoint_then_resume_continues_to_successor() {
        let persistence = Arc::new(InMemoryPersistence::new());
        let eng = WorkflowEngine::new(persistence.clone(), WorkflowConfig::default());
        eng.task(TaskDefinition::new(
            "h",
            task_fn(|p| async move {
                // The first invocation has never completed; a resumed
                // invocation finds the count `interrupt` already bumped.
                if p.execution.execution_count(&TaskName::new("h")) > 0 {
                    Ok(TaskOutcome::with_route(serde_json::json!("continued"), RouteTarget::Next(TaskName::new("after"))))
                } else {
                    Err(p.interrupt(serde_json::json!({"q": "continue?"})).await)
                }
            }),
        ));
        eng.task(TaskDefinition::new("after", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) })));

        let run = WorkflowRun::new(WorkflowId::v4());
        let err = eng.start(&run, TaskName::new("h"), Value::Null).await.unwrap_err();
        let breakpoint_id = err.breakpoint_id().unwrap();

        let resumed_run = WorkflowRun::new(run.workflow_id);
        eng.resume(&resumed_run, breakpoint_id).await.unwrap();
        assert!(resumed_run.execution.is_task_complete(&TaskName::new("after")));
    }

    #[tokio::test]
    async fn abort_graceful_completes_inflight_but_schedules_no_successor() {
        let eng = engine();
        eng.task(TaskDefinition::new(
            "l",
            task_fn(|p| async move {
                p.abort(true);
                Ok(TaskOutcome::with_route(serde_json::json!("done"), RouteTarget::Next(TaskName::new("never"))))
            }),
        ));
        eng.task(TaskDefinition::new("never", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) })));

        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("l"), Value::Null).await.unwrap();

        assert!(run.execution.is_task_complete(&TaskName::new("l")));
        assert!(!run.execution.is_task_complete(&TaskName::new("never")));
        assert!(run.execution.is_graceful_shutdown());
    }

    #[tokio::test]
    async fn on_error_retry_true_continues_attempt_loop() {
        let eng = engine();
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts2 = attempts.clone();
        eng.task(
            TaskDefinition::new(
                "recovering",
                task_fn(move |_p| {
                    let attempts = attempts2.clone();
                    async move {
                        let n = attempts.fetch_add(1, Ordering::SeqCst);
                        if n == 0 {
                            Err(EngineError::execution_failed("recovering", std::io::Error::other("transient")))
                        } else {
                            Ok(TaskOutcome::new(serde_json::json!("recovered")))
                        }
                    }
                }),
            )
            .retry_count(1)
            .on_error(crate::task::error_handler_fn(|_err, _params| async move {
                Ok(crate::task::ErrorHandlerOutcome {
                    retry: true,
                    result: None,
                    next: None,
                })
            })),
        );
        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("recovering"), Value::Null).await.unwrap();
        assert_eq!(run.execution.task_data(&TaskName::new("recovering")), Some(serde_json::json!("recovered")));
    }

    #[tokio::test]
    async fn on_error_supplies_fallback_result_without_retry() {
        let eng = engine();
        eng.task(
            TaskDefinition::new(
                "always_fails",
                task_fn(|_p| async move { Err(EngineError::execution_failed("always_fails", std::io::Error::other("down"))) }),
            )
            .on_error(crate::task::error_handler_fn(|_err, _params| async move {
                Ok(crate::task::ErrorHandlerOutcome {
                    retry: false,
                    result: Some(serde_json::json!("fallback")),
                    next: None,
                })
            })),
        );
        let run = WorkflowRun::new(WorkflowId::v4());
        eng.start(&run, TaskName::new("always_fails"), Value::Null).await.unwrap();
        assert_eq!(run.execution.task_data(&TaskName::new("always_fails")), Some(serde_json::json!("fallback")));
    }

    #[tokio::test]
    async fn timeout_of_zero_fails_immediately() {
        let eng = WorkflowEngine::new(Arc::new(InMemoryPersistence::new()), WorkflowConfig::default());
        eng.task(
            TaskDefinition::new("never_runs_out_of_time", task_fn(|p| async move { Ok(TaskOutcome::new(p.data)) }))
                .timeout_ms(0),
        );
        let run = WorkflowRun::new(WorkflowId::v4());
        let err = eng.start(&run, TaskName::new("never_runs_out_of_time"), Value::Null).await.unwrap_err();
        assert!(matches!(err, EngineError::TaskExecutionFailed { .. } | EngineError::Timeout { .. }));
    }
}
