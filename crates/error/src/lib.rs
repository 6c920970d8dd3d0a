//! # skein-error
//!
//! The error taxonomy shared by the workflow engine and agent graph:
//! task-not-found, timeout, cancellation, breakpoint unwinding, task
//! execution failure, and error-handler failure (see spec §7).

use skein_core::TaskName;

/// Errors surfaced by the workflow engine's scheduler.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A routing destination or `start()` call named a task that was never
    /// registered. Fatal — not retried.
    #[error("task not found: {task}")]
    TaskNotFound {
        /// The unresolved task name.
        task: TaskName,
    },

    /// A task's attempt exceeded its configured `timeoutMs`. Retryable like
    /// any other task execution failure.
    #[error("task '{task}' timed out after {timeout_ms}ms")]
    Timeout {
        /// The task whose attempt timed out.
        task: TaskName,
        /// The configured timeout.
        timeout_ms: u64,
    },

    /// The workflow was aborted; propagated via the cancellation signal
    /// rather than retried.
    #[error("workflow aborted")]
    Cancelled,

    /// Sentinel thrown by `interrupt()` to unwind the attempt loop cleanly.
    /// Never retried, never treated as a failure — the breakpoint was
    /// already persisted before this is thrown.
    #[error("breakpoint reached in task '{task}'")]
    Breakpoint {
        /// The task that called `interrupt()`.
        task: TaskName,
        /// The breakpoint identifier created for resume.
        breakpoint_id: skein_core::BreakpointId,
    },

    /// Any other error thrown from a task's `execute`. Retried up to
    /// `retryCount`, then handed to `onError`, then rethrown.
    #[error("task '{task}' execution failed: {source}")]
    TaskExecutionFailed {
        /// The task whose `execute` threw.
        task: TaskName,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The task's `onError` handler itself threw. The original error is
    /// logged and rethrown per spec §7; this variant carries both.
    #[error("error handler for task '{task}' failed: {source}")]
    ErrorHandlerFailed {
        /// The task whose `onError` handler threw.
        task: TaskName,
        /// The error raised by the handler itself.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Distinguishes errors that should trigger another attempt-loop iteration
/// from ones that should propagate immediately. Mirrors the `Retryable`
/// trait used by the engine's resilience layer so the attempt loop never
/// has to pattern-match error kinds directly.
pub trait Retryable {
    /// Whether this error should trigger another retry attempt.
    fn is_retryable(&self) -> bool;

    /// Whether this error should never be retried, regardless of remaining
    /// attempts (the complement is not always `!is_retryable()` — a
    /// breakpoint is neither retried nor "terminal" in the failure sense).
    fn is_terminal(&self) -> bool;
}

impl Retryable for EngineError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::TaskExecutionFailed { .. })
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound { .. } | Self::Cancelled | Self::Breakpoint { .. }
        )
    }
}

impl EngineError {
    /// Construct a [`EngineError::TaskExecutionFailed`] from any standard
    /// error.
    pub fn execution_failed(
        task: impl Into<TaskName>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::TaskExecutionFailed {
            task: task.into(),
            source: Box::new(source),
        }
    }

    /// Returns the breakpoint id carried by this error, if it is a
    /// [`EngineError::Breakpoint`].
    #[must_use]
    pub fn breakpoint_id(&self) -> Option<skein_core::BreakpointId> {
        match self {
            Self::Breakpoint { breakpoint_id, .. } => Some(*breakpoint_id),
            _ => None,
        }
    }
}
