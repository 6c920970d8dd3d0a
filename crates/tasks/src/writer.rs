//! **writer** (spec §4.9): streams the LLM's drafted answer through a
//! `ChunkBuffer`, forwarding flushed chunks as `PENDING` answer events, and
//! routes to `reflector`. The LLM provider itself is out of scope — only
//! the `TextGenerator` capability is required.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use skein_chunk_buffer::ChunkBuffer;
use skein_core::{GenerateTextRequest, TaskName, TextGenerator};
use skein_error::EngineError;
use skein_eventbus::EventBus;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::{DRAFT_ANSWER, QUERY, SOURCES};
use crate::events::{AnswerEvent, AnswerStatus, ANSWER};

const FLUSH_THRESHOLD: usize = 80;

#[must_use]
pub fn build_writer_task(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> TaskDefinition {
    let model = model.into();
    TaskDefinition::new(
        "writer",
        task_fn(move |params| {
            let generator = generator.clone();
            let model = model.clone();
            async move {
                let query = params.context.get(QUERY).unwrap_or_default();
                let sources = params.context.get(SOURCES).unwrap_or_default();
                let prompt = build_prompt(&query, &sources);

                let events: Arc<EventBus> = params.events.clone();
                let buffer = Arc::new(Mutex::new(ChunkBuffer::new(
                    FLUSH_THRESHOLD,
                    vec![". ".to_string(), "\n".to_string()],
                    move |chunk: &str, _full: &str| {
                        events.emit(
                            ANSWER,
                            AnswerEvent {
                                text: chunk.to_string(),
                                final_text: None,
                                status: AnswerStatus::Pending,
                            },
                        );
                    },
                )));

                let buffer_for_chunk = buffer.clone();
                let on_chunk = Box::new(move |chunk: &str, _full_text: &str| {
                    buffer_for_chunk.lock().push(chunk);
                });

                let request = GenerateTextRequest::new(model, prompt, params.signal.clone()).with_on_chunk(on_chunk);
                let draft = generator
                    .generate_text(request)
                    .await
                    .map_err(|source| EngineError::execution_failed("writer", source))?;
                buffer.lock().end();

                params.context.set(DRAFT_ANSWER, draft.clone());

                Ok(TaskOutcome::with_route(Value::String(draft), RouteTarget::Next(TaskName::new("reflector"))))
            }
        }),
    )
}

fn build_prompt(query: &str, sources: &[crate::events::SourceItem]) -> String {
    let mut prompt = format!("Write a complete answer to: {query}\n");
    if !sources.is_empty() {
        prompt.push_str("\nUse these sources:\n");
        for source in sources {
            prompt.push_str(&format!("- {} ({}): {}\n", source.title, source.link, source.snippet));
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skein_context::TypedContext;
    use skein_core::{GenerateTextError, WorkflowId};
    use skein_persistence::InMemoryPersistence;
    use skein_workflow::{TaskExecute, TaskParams, WorkflowConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct StreamingGenerator;

    #[async_trait]
    impl TextGenerator for StreamingGenerator {
        async fn generate_text(&self, request: GenerateTextRequest) -> Result<String, GenerateTextError> {
            let chunks = ["Paris is the capital of France. ", "It sits on the Seine."];
            let mut full = String::new();
            for chunk in chunks {
                full.push_str(chunk);
                if let Some(cb) = &request.on_chunk {
                    cb(chunk, &full);
                }
            }
            Ok(full)
        }
    }

    fn params(events: Arc<EventBus>) -> TaskParams {
        TaskParams::for_test(
            Value::Null,
            Arc::new(skein_execution::ExecutionContext::new(events.clone())),
            Arc::new(TypedContext::new()),
            events,
            WorkflowConfig::default(),
            CancellationToken::new(),
            TaskName::new("writer"),
            WorkflowId::v4(),
            Arc::new(InMemoryPersistence::new()),
        )
    }

    #[tokio::test]
    async fn streams_chunks_and_stores_full_draft() {
        let task = build_writer_task(Arc::new(StreamingGenerator), "test-model");
        let events = Arc::new(EventBus::new());
        let p = params(events.clone());
        p.context.set(QUERY, "what is the capital of France?".to_string());

        let flushed = Arc::new(AtomicUsize::new(0));
        let flushed_clone = flushed.clone();
        events.on(ANSWER, move |_event: AnswerEvent| {
            flushed_clone.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = task.execute.execute(p.clone()).await.unwrap();
        assert_eq!(outcome.next, Some(RouteTarget::Next(TaskName::new("reflector"))));
        assert!(flushed.load(Ordering::SeqCst) > 0);

        let draft = p.context.get(DRAFT_ANSWER).unwrap();
        assert!(draft.contains("Paris"));
    }
}
