//! **analyzer / reflector** (spec §4.9): a reasoning pre-step that critiques
//! the drafted answer against the original query, then routes to
//! `refineQuery` if the answer is judged insufficient (bounded by
//! `max_reflections`, tracked via `executionCounts`) or to `completion`
//! otherwise. The spec names this task under both labels; it is registered
//! once, as `reflector`, since every other task's routing references that
//! name.

use std::sync::Arc;

use serde_json::Value;
use skein_core::{GenerateTextRequest, TaskName, TextGenerator};
use skein_error::EngineError;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::{CRITIQUE, DRAFT_ANSWER, QUERY};

#[must_use]
pub fn build_reflector_task(generator: Arc<dyn TextGenerator>, model: impl Into<String>, max_reflections: u32) -> TaskDefinition {
    let model = model.into();
    TaskDefinition::new(
        "reflector",
        task_fn(move |params| {
            let generator = generator.clone();
            let model = model.clone();
            async move {
                let query = params.context.get(QUERY).unwrap_or_default();
                let draft = params.context.get(DRAFT_ANSWER).unwrap_or_default();
                let prompt = format!(
                    "Query: {query}\nDraft answer: {draft}\n\nDoes the draft fully answer the query? \
                     Reply starting with INSUFFICIENT followed by a short critique, or with SUFFICIENT."
                );

                let request = GenerateTextRequest::new(model, prompt, params.signal.clone());
                let critique = generator
                    .generate_text(request)
                    .await
                    .map_err(|source| EngineError::execution_failed("reflector", source))?;

                params.context.set(CRITIQUE, critique.clone());

                let insufficient = critique.trim_start().starts_with("INSUFFICIENT");
                let exhausted = params.execution.has_reached_max_runs(&TaskName::new("reflector"), max_reflections);

                let next = if insufficient && !exhausted {
                    RouteTarget::Next(TaskName::new("refineQuery"))
                } else {
                    RouteTarget::Next(TaskName::new("completion"))
                };

                Ok(TaskOutcome::with_route(Value::String(critique), next))
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skein_context::TypedContext;
    use skein_core::{GenerateTextError, WorkflowId};
    use skein_eventbus::EventBus;
    use skein_execution::ExecutionContext;
    use skein_persistence::InMemoryPersistence;
    use skein_workflow::{TaskExecute, TaskParams, WorkflowConfig};
    use std::sync::Mutex as StdMutex;
    use tokio_util::sync::CancellationToken;

    struct ScriptedGenerator {
        replies: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate_text(&self, _request: GenerateTextRequest) -> Result<String, GenerateTextError> {
            Ok(self.replies.lock().unwrap().pop().unwrap_or_else(|| "SUFFICIENT".to_string()))
        }
    }

    fn params(events: Arc<EventBus>) -> TaskParams {
        TaskParams::for_test(
            Value::Null,
            Arc::new(ExecutionContext::new(events.clone())),
            Arc::new(TypedContext::new()),
            events,
            WorkflowConfig::default(),
            CancellationToken::new(),
            TaskName::new("reflector"),
            WorkflowId::v4(),
            Arc::new(InMemoryPersistence::new()),
        )
    }

    #[tokio::test]
    async fn insufficient_critique_routes_to_refine_query() {
        let generator = Arc::new(ScriptedGenerator {
            replies: StdMutex::new(vec!["INSUFFICIENT missing a date".to_string()]),
        });
        let task = build_reflector_task(generator, "test-model", 2);
        let events = Arc::new(EventBus::new());
        let p = params(events);

        let outcome = task.execute.execute(p).await.unwrap();
        assert_eq!(outcome.next, Some(RouteTarget::Next(TaskName::new("refineQuery"))));
    }

    #[tokio::test]
    async fn sufficient_critique_routes_to_completion() {
        let generator = Arc::new(ScriptedGenerator {
            replies: StdMutex::new(vec!["SUFFICIENT".to_string()]),
        });
        let task = build_reflector_task(generator, "test-model", 2);
        let events = Arc::new(EventBus::new());
        let p = params(events);

        let outcome = task.execute.execute(p).await.unwrap();
        assert_eq!(outcome.next, Some(RouteTarget::Next(TaskName::new("completion"))));
    }

    #[tokio::test]
    async fn exhausted_reflection_budget_forces_completion_despite_insufficient_verdict() {
        let generator = Arc::new(ScriptedGenerator {
            replies: StdMutex::new(vec!["INSUFFICIENT still missing detail".to_string()]),
        });
        let task = build_reflector_task(generator, "test-model", 1);
        let events = Arc::new(EventBus::new());
        let p = params(events);

        p.execution.mark_task_complete(&TaskName::new("reflector"), Value::Null);

        let outcome = task.execute.execute(p).await.unwrap();
        assert_eq!(outcome.next, Some(RouteTarget::Next(TaskName::new("completion"))));
    }
}
