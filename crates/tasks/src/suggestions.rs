//! **suggestions** (spec §4.9): a fan-out sibling of `completion`, reachable
//! via parallel routing, that proposes follow-up questions and stores them
//! as a dedicated context update. Terminal.

use std::sync::Arc;

use serde_json::Value;
use skein_core::{GenerateTextRequest, TextGenerator};
use skein_error::EngineError;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::{DRAFT_ANSWER, SUGGESTIONS};

#[must_use]
pub fn build_suggestions_task(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> TaskDefinition {
    let model = model.into();
    TaskDefinition::new(
        "suggestions",
        task_fn(move |params| {
            let generator = generator.clone();
            let model = model.clone();
            async move {
                let draft = params.context.get(DRAFT_ANSWER).unwrap_or_default();
                let prompt = format!("Propose three brief follow-up questions a reader of this answer might ask:\n{draft}");

                let request = GenerateTextRequest::new(model, prompt, params.signal.clone());
                let response = generator
                    .generate_text(request)
                    .await
                    .map_err(|source| EngineError::execution_failed("suggestions", source))?;

                let suggestions: Vec<String> = response.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect();
                params.context.set(SUGGESTIONS, suggestions.clone());

                Ok(TaskOutcome::with_route(serde_json::json!(suggestions), RouteTarget::End))
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skein_context::TypedContext;
    use skein_core::{GenerateTextError, TaskName, WorkflowId};
    use skein_eventbus::EventBus;
    use skein_execution::ExecutionContext;
    use skein_persistence::InMemoryPersistence;
    use skein_workflow::{TaskExecute, TaskParams, WorkflowConfig};
    use tokio_util::sync::CancellationToken;

    struct ListGenerator;

    #[async_trait]
    impl TextGenerator for ListGenerator {
        async fn generate_text(&self, _request: GenerateTextRequest) -> Result<String, GenerateTextError> {
            Ok("What else changed?\nWhy did it happen?\n\nWho was involved?".to_string())
        }
    }

    #[tokio::test]
    async fn stores_parsed_suggestions_and_ends() {
        let task = build_suggestions_task(Arc::new(ListGenerator), "test-model");
        let events = Arc::new(EventBus::new());
        let p = TaskParams::for_test(
            Value::Null,
            Arc::new(ExecutionContext::new(events.clone())),
            Arc::new(TypedContext::new()),
            events,
            WorkflowConfig::default(),
            CancellationToken::new(),
            TaskName::new("suggestions"),
            WorkflowId::v4(),
            Arc::new(InMemoryPersistence::new()),
        );

        let outcome = task.execute.execute(p.clone()).await.unwrap();
        assert_eq!(outcome.next, Some(RouteTarget::End));
        assert_eq!(p.context.get(SUGGESTIONS).unwrap().len(), 3);
    }
}
