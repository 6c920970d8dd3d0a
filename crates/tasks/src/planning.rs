//! **planning** (spec §4.9): asks the LLM capability for a numbered list of
//! research steps, stores them under the `plan` context key, and routes to
//! `webSearch`.

use std::sync::Arc;

use serde_json::Value;
use skein_core::{GenerateTextRequest, TaskName, TextGenerator};
use skein_error::EngineError;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::{PLAN, QUERY};

#[must_use]
pub fn build_planning_task(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> TaskDefinition {
    let model = model.into();
    TaskDefinition::new(
        "planning",
        task_fn(move |params| {
            let generator = generator.clone();
            let model = model.clone();
            async move {
                let query = params.context.get(QUERY).unwrap_or_default();
                let prompt = format!("Break the following request into a numbered list of research steps:\n{query}");

                let request = GenerateTextRequest::new(model, prompt, params.signal.clone());
                let response = generator
                    .generate_text(request)
                    .await
                    .map_err(|source| EngineError::execution_failed("planning", source))?;

                let steps = parse_numbered_list(&response);
                params.context.set(PLAN, steps);

                Ok(TaskOutcome::with_route(Value::Null, RouteTarget::Next(TaskName::new("webSearch"))))
            }
        }),
    )
}

fn parse_numbered_list(response: &str) -> Vec<String> {
    response
        .lines()
        .map(|line| line.trim().trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')').trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
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
    use tokio_util::sync::CancellationToken;

    #[test]
    fn parses_numbered_and_bare_lines() {
        let steps = parse_numbered_list("1. find sources\n2) read docs\n\nsummarize");
        assert_eq!(steps, vec!["find sources", "read docs", "summarize"]);
    }

    #[test]
    fn empty_response_yields_empty_plan() {
        assert!(parse_numbered_list("").is_empty());
    }

    struct NumberedListGenerator;

    #[async_trait]
    impl TextGenerator for NumberedListGenerator {
        async fn generate_text(&self, _request: GenerateTextRequest) -> Result<String, GenerateTextError> {
            Ok("1. find sources\n2. read docs".to_string())
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
            TaskName::new("planning"),
            WorkflowId::v4(),
            Arc::new(InMemoryPersistence::new()),
        )
    }

    #[tokio::test]
    async fn stores_parsed_plan_and_routes_to_web_search() {
        let task = build_planning_task(Arc::new(NumberedListGenerator), "test-model");
        let events = Arc::new(EventBus::new());
        let p = params(events);
        p.context.set(QUERY, "how do volcanoes form?".to_string());

        let outcome = task.execute.execute(p.clone()).await.unwrap();
        assert_eq!(outcome.next, Some(RouteTarget::Next(TaskName::new("webSearch"))));
        assert_eq!(p.context.get(PLAN).unwrap(), vec!["find sources".to_string(), "read docs".to_string()]);
    }
}
