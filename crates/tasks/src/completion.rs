//! **completion** (spec §4.9): assembles the final answer from context,
//! emits it as `COMPLETED`, and halts the workflow.

use serde_json::Value;
use skein_workflow::{task_fn, RouteTarget, TaskDefinition, TaskOutcome};

use crate::context_keys::DRAFT_ANSWER;
use crate::events::{AnswerEvent, AnswerStatus, ANSWER};

#[must_use]
pub fn build_completion_task() -> TaskDefinition {
    TaskDefinition::new(
        "completion",
        task_fn(|params| async move {
            let answer = params.context.get(DRAFT_ANSWER).unwrap_or_default();

            params.events.emit(
                ANSWER,
                AnswerEvent {
                    text: answer.clone(),
                    final_text: Some(answer.clone()),
                    status: AnswerStatus::Completed,
                },
            );

            Ok(TaskOutcome::with_route(Value::String(answer), RouteTarget::End))
        }),
    )
}
