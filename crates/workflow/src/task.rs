//! Task registration (spec §3, §4.5 "Registration"): the `execute`/`route`/
//! `onError` capabilities a registered task is built from.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use skein_core::TaskName;
use skein_error::EngineError;

use crate::params::TaskParams;
use crate::route::RouteTarget;

/// What a task's `execute` returns: its result data plus an optional
/// imperative successor, matching spec §9's `Result | ResultWithRoute`
/// tagged variant.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub result: Value,
    pub next: Option<RouteTarget>,
}

impl TaskOutcome {
    #[must_use]
    pub fn new(result: Value) -> Self {
        Self { result, next: None }
    }

    #[must_use]
    pub fn with_route(result: Value, next: RouteTarget) -> Self {
        Self { result, next: Some(next) }
    }
}

/// A task's asynchronous body.
#[async_trait]
pub trait TaskExecute: Send + Sync {
    async fn execute(&self, params: TaskParams) -> Result<TaskOutcome, EngineError>;
}

struct FnTask<F>(F);

#[async_trait]
impl<F, Fut> TaskExecute for FnTask<F>
where
    F: Fn(TaskParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<TaskOutcome, EngineError>> + Send,
{
    async fn execute(&self, params: TaskParams) -> Result<TaskOutcome, EngineError> {
        (self.0)(params).await
    }
}

/// Wrap a plain async closure as a [`TaskExecute`].
pub fn task_fn<F, Fut>(f: F) -> Arc<dyn TaskExecute>
where
    F: Fn(TaskParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<TaskOutcome, EngineError>> + Send + 'static,
{
    Arc::new(FnTask(f))
}

/// Synchronously resolves a task's successor from its result, the weakest
/// of the three routing mechanisms in spec §9's resolution order. The
/// default router returns [`RouteTarget::Terminal`].
pub trait Router: Send + Sync {
    fn route(&self, result: &Value, params: &TaskParams) -> RouteTarget;
}

struct FnRouter<F>(F);

impl<F> Router for FnRouter<F>
where
    F: Fn(&Value, &TaskParams) -> RouteTarget + Send + Sync,
{
    fn route(&self, result: &Value, params: &TaskParams) -> RouteTarget {
        (self.0)(result, params)
    }
}

/// Wrap a plain closure as a [`Router`].
pub fn router_fn<F>(f: F) -> Arc<dyn Router>
where
    F: Fn(&Value, &TaskParams) -> RouteTarget + Send + Sync + 'static,
{
    Arc::new(FnRouter(f))
}

/// What an `onError` handler returns (spec §4.5 step 8).
#[derive(Debug, Clone, Default)]
pub struct ErrorHandlerOutcome {
    /// If `true` and attempts remain, the attempt loop retries instead of
    /// rethrowing.
    pub retry: bool,
    /// If set, the attempt loop treats this as the task's successful
    /// result and proceeds through normal successor resolution.
    pub result: Option<Value>,
    /// Successor override to use alongside `result`.
    pub next: Option<RouteTarget>,
}

/// A task's `onError` handler.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    async fn handle(&self, error: &EngineError, params: &TaskParams) -> Result<ErrorHandlerOutcome, EngineError>;
}

struct FnErrorHandler<F>(F);

#[async_trait]
impl<F, Fut> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(&EngineError, &TaskParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ErrorHandlerOutcome, EngineError>> + Send,
{
    async fn handle(&self, error: &EngineError, params: &TaskParams) -> Result<ErrorHandlerOutcome, EngineError> {
        (self.0)(error, params).await
    }
}

/// Wrap a plain async closure as an [`ErrorHandler`].
pub fn error_handler_fn<F, Fut>(f: F) -> Arc<dyn ErrorHandler>
where
    F: Fn(&EngineError, &TaskParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ErrorHandlerOutcome, EngineError>> + Send + 'static,
{
    Arc::new(FnErrorHandler(f))
}

/// A registered task (spec §4.5 "Registration"). Immutable once inserted
/// into the engine; re-registering the same name replaces the prior
/// definition wholesale.
#[derive(Clone)]
pub struct TaskDefinition {
    pub name: TaskName,
    pub execute: Arc<dyn TaskExecute>,
    pub route: Option<Arc<dyn Router>>,
    pub dependencies: Vec<TaskName>,
    pub retry_count: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub on_error: Option<Arc<dyn ErrorHandler>>,
}

impl TaskDefinition {
    #[must_use]
    pub fn new(name: impl Into<TaskName>, execute: Arc<dyn TaskExecute>) -> Self {
        Self {
            name: name.into(),
            execute,
            route: None,
            dependencies: Vec::new(),
            retry_count: None,
            timeout_ms: None,
            on_error: None,
        }
    }

    #[must_use]
    pub fn route(mut self, route: Arc<dyn Router>) -> Self {
        self.route = Some(route);
        self
    }

    #[must_use]
    pub fn dependencies(mut self, dependencies: impl IntoIterator<Item = TaskName>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    #[must_use]
    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    #[must_use]
    pub fn on_error(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.on_error = Some(handler);
        self
    }
}
