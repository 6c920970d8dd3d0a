//! **web-search** (spec §4.9): invokes the injected tool capability once
//! per planned step, emits the combined results as `sources`, and routes to
//! `writer`. The search tool itself is out of scope — only the
//! `ToolInvoker` capability is required.

use std::sync::Arc;

use serde_json::Value;
use skein_core::{TaskName, ToolInvoker};
use skein_error::EngineError;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::{PLAN, SOURCES};
use crate::events::{SourceItem, SOURCES_EVENT};

#[must_use]
pub fn build_web_search_task(tool_invoker: Arc<dyn ToolInvoker>) -> TaskDefinition {
    TaskDefinition::new(
        "webSearch",
        task_fn(move |params| {
            let tool_invoker = tool_invoker.clone();
            async move {
                let steps = params.context.get(PLAN).unwrap_or_default();

                let mut sources = Vec::new();
                for step in &steps {
                    let result = tool_invoker
                        .invoke("webSearch", serde_json::json!({ "query": step }))
                        .await
                        .map_err(|source| EngineError::execution_failed("webSearch", source))?;
                    let mut found: Vec<SourceItem> = serde_json::from_value(result).unwrap_or_default();
                    sources.append(&mut found);
                }

                params.events.emit(SOURCES_EVENT, sources.clone());
                params.context.set(SOURCES, sources);

                Ok(TaskOutcome::with_route(Value::Null, RouteTarget::Next(TaskName::new("writer"))))
            }
        }),
    )
}
