//! # skein-workflow
//!
//! The task registry and scheduler (spec §4.5): dependency gating, the
//! attempt loop with timeout and retry, routing resolution across the
//! three overlapping mechanisms of spec §9, breakpoints, resume, and
//! graceful/hard abort. Built atop `skein-execution` (per-run state),
//! `skein-context`/`skein-eventbus` (shared stores a task can observe and
//! mutate), and `skein-persistence` (durable snapshots after every step).

mod config;
mod engine;
mod params;
mod route;
mod snapshot;
mod task;

pub use config::WorkflowConfig;
pub use engine::{WorkflowEngine, WorkflowRun};
pub use params::TaskParams;
pub use route::{ParallelDestination, RouteTarget};
pub use snapshot::build_snapshot;
pub use task::{
    error_handler_fn, router_fn, task_fn, ErrorHandler, ErrorHandlerOutcome, Router, TaskDefinition, TaskExecute,
    TaskOutcome,
};
