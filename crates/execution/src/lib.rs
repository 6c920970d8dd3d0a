//! # skein-execution
//!
//! The per-workflow `ExecutionContext`: the completed/running task sets,
//! per-task result data, execution counts, timing history, abort flags, and
//! the active breakpoint, if any (spec §4.4). The workflow engine consumes
//! this crate to track a single run; none of the bookkeeping here is
//! specific to any one task's semantics.
//!
//! A task name is in `running_tasks` iff it is currently executing: it is
//! added there immediately before the engine invokes the task's `execute`
//! and removed the moment that invocation settles, success or failure. It
//! only joins `completed_tasks` on success. The same name can reappear in
//! both sets across a retry loop within a single execution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skein_core::{BreakpointId, TaskName};
use skein_eventbus::{ChannelKey, EventBus};
use skein_persistence::{decode_map, decode_set, encode_map, encode_set, PersistenceError};

/// Emitted on [`ExecutionContext::mark_task_complete`]: one entry per task
/// completion, carrying the data the task produced.
pub static TASK_EXECUTION: ChannelKey<TaskExecutionEvent> = ChannelKey::new("taskExecution");

/// Payload of the `taskExecution` channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExecutionEvent {
    pub task: TaskName,
    pub data: Value,
    pub execution_count: u32,
}

/// Whether a completed timing attempt succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingStatus {
    Success,
    Failed,
}

/// One attempt's timing record. `end_time`/`duration_ms`/`status` are only
/// populated once [`ExecutionContext::end_task_timing`] closes it out; an
/// attempt that is still running has all three as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTiming {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub status: Option<TimingStatus>,
    pub error: Option<String>,
}

impl TaskTiming {
    fn started(now: DateTime<Utc>) -> Self {
        Self {
            start_time: now,
            end_time: None,
            duration_ms: None,
            status: None,
            error: None,
        }
    }
}

/// A breakpoint raised mid-execution, awaiting [`ExecutionContext::clear_breakpoint`]
/// on resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakpoint {
    pub id: BreakpointId,
    pub task: TaskName,
    pub data: Value,
}

/// Per-task timing rollup returned by [`ExecutionContext::task_timing_summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTimingSummary {
    pub attempts: usize,
    pub failures: usize,
    pub total_duration: String,
    pub average_duration: String,
}

/// Workflow-level timing rollup returned by [`ExecutionContext::main_timing_summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainTimingSummary {
    pub total_attempts: usize,
    pub total_failures: usize,
    pub slowest_task: Option<TaskName>,
    pub most_retried_task: Option<TaskName>,
    pub overall_status: String,
}

fn format_duration_ms(ms: i64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}

#[derive(Default)]
struct Inner {
    completed_tasks: std::collections::HashSet<TaskName>,
    running_tasks: std::collections::HashSet<TaskName>,
    task_data: HashMap<TaskName, Value>,
    execution_counts: HashMap<TaskName, u32>,
    timings: HashMap<TaskName, Vec<TaskTiming>>,
    aborted: bool,
    graceful_shutdown: bool,
    breakpoint: Option<Breakpoint>,
}

/// The mutable state of a single workflow run. Cheap to clone as an `Arc`,
/// internally synchronized so the engine can share one context across the
/// task closures it invokes.
pub struct ExecutionContext {
    inner: RwLock<Inner>,
    events: Arc<EventBus>,
}

impl ExecutionContext {
    /// Build a fresh, empty context wired to `events` so task completions
    /// are announced on the `taskExecution` channel.
    #[must_use]
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    /// Mark `name` as currently executing. Called by the engine immediately
    /// before invoking a task's `execute`.
    pub fn start_running(&self, name: &TaskName) {
        self.inner.write().running_tasks.insert(name.clone());
    }

    /// Remove `name` from the running set without marking it complete. Used
    /// on the failure path once retries are exhausted.
    pub fn fail_running(&self, name: &TaskName) {
        self.inner.write().running_tasks.remove(name);
    }

    /// Move `name` from running to completed, record its output data,
    /// increment its execution count, and emit a `taskExecution` event.
    pub fn mark_task_complete(&self, name: &TaskName, data: Value) {
        let execution_count = {
            let mut inner = self.inner.write();
            inner.running_tasks.remove(name);
            inner.completed_tasks.insert(name.clone());
            inner.task_data.insert(name.clone(), data.clone());
            let count = inner.execution_counts.entry(name.clone()).or_insert(0);
            *count += 1;
            *count
        };
        self.events.emit(
            TASK_EXECUTION,
            TaskExecutionEvent {
                task: name.clone(),
                data,
                execution_count,
            },
        );
    }

    /// Remove `name` from the completed set so it can be re-entered as a
    /// dependency or loop target. Leaves its execution count and prior task
    /// data untouched.
    pub fn reset_task_completion(&self, name: &TaskName) {
        self.inner.write().completed_tasks.remove(name);
    }

    /// Open a new timing record for `name`, starting at `now`.
    pub fn start_task_timing(&self, name: &TaskName, now: DateTime<Utc>) {
        self.inner
            .write()
            .timings
            .entry(name.clone())
            .or_default()
            .push(TaskTiming::started(now));
    }

    /// Close out `name`'s most recent open timing record with the outcome.
    /// A no-op if there is no open record (defensive: the engine should
    /// always pair this with a prior [`Self::start_task_timing`]).
    pub fn end_task_timing(&self, name: &TaskName, now: DateTime<Utc>, error: Option<String>) {
        let mut inner = self.inner.write();
        let Some(record) = inner
            .timings
            .get_mut(name)
            .and_then(|records| records.iter_mut().rev().find(|r| r.end_time.is_none()))
        else {
            return;
        };
        record.end_time = Some(now);
        record.duration_ms = Some((now - record.start_time).num_milliseconds());
        record.status = Some(if error.is_some() {
            TimingStatus::Failed
        } else {
            TimingStatus::Success
        });
        record.error = error;
    }

    /// Set the abort flag. `graceful = true` lets in-flight tasks finish and
    /// stops only future dispatch; `graceful = false` is a hard stop.
    pub fn abort_workflow(&self, graceful: bool) {
        let mut inner = self.inner.write();
        inner.aborted = true;
        inner.graceful_shutdown = graceful;
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.inner.read().aborted
    }

    #[must_use]
    pub fn is_graceful_shutdown(&self) -> bool {
        self.inner.read().graceful_shutdown
    }

    #[must_use]
    pub fn is_task_complete(&self, name: &TaskName) -> bool {
        self.inner.read().completed_tasks.contains(name)
    }

    #[must_use]
    pub fn is_task_running(&self, name: &TaskName) -> bool {
        self.inner.read().running_tasks.contains(name)
    }

    #[must_use]
    pub fn task_data(&self, name: &TaskName) -> Option<Value> {
        self.inner.read().task_data.get(name).cloned()
    }

    #[must_use]
    pub fn execution_count(&self, name: &TaskName) -> u32 {
        self.inner.read().execution_counts.get(name).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_reached_max_runs(&self, name: &TaskName, max: u32) -> bool {
        self.execution_count(name) >= max
    }

    /// Record a breakpoint and park it until [`Self::clear_breakpoint`]. The
    /// engine is responsible for persisting the snapshot before unwinding.
    pub fn set_breakpoint(&self, breakpoint: Breakpoint) {
        self.inner.write().breakpoint = Some(breakpoint);
    }

    #[must_use]
    pub fn breakpoint(&self) -> Option<Breakpoint> {
        self.inner.read().breakpoint.clone()
    }

    pub fn clear_breakpoint(&self) {
        self.inner.write().breakpoint = None;
    }

    /// Per-task timing rollup: attempt/failure counts and human-readable
    /// total/average durations, over closed (ended) attempts only.
    #[must_use]
    pub fn task_timing_summary(&self) -> HashMap<TaskName, TaskTimingSummary> {
        let inner = self.inner.read();
        inner
            .timings
            .iter()
            .map(|(name, records)| {
                let closed: Vec<&TaskTiming> = records.iter().filter(|r| r.duration_ms.is_some()).collect();
                let attempts = closed.len();
                let failures = closed.iter().filter(|r| r.status == Some(TimingStatus::Failed)).count();
                let total: i64 = closed.iter().filter_map(|r| r.duration_ms).sum();
                let average = if attempts == 0 { 0 } else { total / attempts as i64 };
                (
                    name.clone(),
                    TaskTimingSummary {
                        attempts,
                        failures,
                        total_duration: format_duration_ms(total),
                        average_duration: format_duration_ms(average),
                    },
                )
            })
            .collect()
    }

    /// Workflow-level timing rollup across every task.
    #[must_use]
    pub fn main_timing_summary(&self) -> MainTimingSummary {
        let per_task = self.task_timing_summary();
        let inner = self.inner.read();

        let total_attempts: usize = per_task.values().map(|s| s.attempts).sum();
        let total_failures: usize = per_task.values().map(|s| s.failures).sum();

        let slowest_task = inner
            .timings
            .iter()
            .filter_map(|(name, records)| {
                records.iter().filter_map(|r| r.duration_ms).max().map(|d| (name.clone(), d))
            })
            .max_by_key(|(_, d)| *d)
            .map(|(name, _)| name);

        let most_retried_task = per_task
            .iter()
            .filter(|(_, summary)| summary.attempts > 1)
            .max_by_key(|(_, summary)| summary.attempts)
            .map(|(name, _)| name.clone());

        let overall_status = if inner.aborted && !inner.graceful_shutdown {
            "aborted".to_string()
        } else if total_failures > 0 {
            "completed_with_failures".to_string()
        } else {
            "completed".to_string()
        };

        MainTimingSummary {
            total_attempts,
            total_failures,
            slowest_task,
            most_retried_task,
            overall_status,
        }
    }

    /// Encode the full context state for [`skein_persistence::WorkflowSnapshot::workflow_state`].
    #[must_use]
    pub fn snapshot(&self) -> Value {
        let inner = self.inner.read();
        serde_json::json!({
            "completedTasks": encode_set(inner.completed_tasks.iter().cloned()),
            "runningTasks": encode_set(inner.running_tasks.iter().cloned()),
            "taskData": encode_map(&stringify_keys(&inner.task_data)),
            "executionCounts": encode_map(&stringify_keys(&inner.execution_counts)),
            "timings": encode_map(&stringify_keys(&inner.timings)),
            "aborted": inner.aborted,
            "gracefulShutdown": inner.graceful_shutdown,
            "breakpoint": inner.breakpoint,
        })
    }

    /// Restore state previously produced by [`Self::snapshot`]. Does not
    /// notify any listeners; this is a silent resume, matching
    /// [`EventBus::set_all_state`].
    ///
    /// # Errors
    /// Returns an error if `snapshot` doesn't match the expected shape.
    pub fn restore(&self, snapshot: &Value) -> Result<(), PersistenceError> {
        let completed_tasks: std::collections::HashSet<TaskName> = decode_set(&snapshot["completedTasks"])?
            .into_iter()
            .collect();
        let running_tasks: std::collections::HashSet<TaskName> = decode_set(&snapshot["runningTasks"])?
            .into_iter()
            .collect();
        let task_data: HashMap<TaskName, Value> = decode_map::<Value>(&snapshot["taskData"])?
            .into_iter()
            .map(|(k, v)| (TaskName::new(k), v))
            .collect();
        let execution_counts: HashMap<TaskName, u32> = decode_map::<u32>(&snapshot["executionCounts"])?
            .into_iter()
            .map(|(k, v)| (TaskName::new(k), v))
            .collect();
        let timings: HashMap<TaskName, Vec<TaskTiming>> = decode_map::<Vec<TaskTiming>>(&snapshot["timings"])?
            .into_iter()
            .map(|(k, v)| (TaskName::new(k), v))
            .collect();
        let aborted = snapshot["aborted"].as_bool().unwrap_or(false);
        let graceful_shutdown = snapshot["gracefulShutdown"].as_bool().unwrap_or(false);
        let breakpoint = serde_json::from_value(snapshot["breakpoint"].clone()).unwrap_or(None);

        let mut inner = self.inner.write();
        inner.completed_tasks = completed_tasks;
        inner.running_tasks = running_tasks;
        inner.task_data = task_data;
        inner.execution_counts = execution_counts;
        inner.timings = timings;
        inner.aborted = aborted;
        inner.graceful_shutdown = graceful_shutdown;
        inner.breakpoint = breakpoint;
        Ok(())
    }
}

fn stringify_keys<V: Clone>(map: &HashMap<TaskName, V>) -> HashMap<String, V> {
    map.iter().map(|(k, v)| (k.as_str().to_string(), v.clone())).collect()
}
