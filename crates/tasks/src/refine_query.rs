//! **refine-query** (spec §4.9): rewrites the user's query using the
//! reflector's critique, then routes back to `planning` — a cyclic route.
//! The re-entry reset (`resetTaskCompletion("planning")`) is handled by the
//! engine's own scheduler step (spec §4.5 step 4) on the next `executeTask`
//! for `planning`; this task only needs to name it as the successor.

use std::sync::Arc;

use serde_json::Value;
use skein_core::{GenerateTextRequest, TaskName, TextGenerator};
use skein_error::EngineError;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::{CRITIQUE, QUERY};

#[must_use]
pub fn build_refine_query_task(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> TaskDefinition {
    let model = model.into();
    TaskDefinition::new(
        "refineQuery",
        task_fn(move |params| {
            let generator = generator.clone();
            let model = model.clone();
            async move {
                let query = params.context.get(QUERY).unwrap_or_default();
                let critique = params.context.get(CRITIQUE).unwrap_or_default();
                let prompt = format!("Original query: {query}\nCritique: {critique}\n\nRewrite the query to address the critique.");

                let request = GenerateTextRequest::new(model, prompt, params.signal.clone());
                let refined = generator
                    .generate_text(request)
                    .await
                    .map_err(|source| EngineError::execution_failed("refineQuery", source))?;

                params.context.set(QUERY, refined.clone());

                Ok(TaskOutcome::with_route(Value::String(refined), RouteTarget::Next(TaskName::new("planning"))))
            }
        }),
    )
}
