//! Wires the eight built-in tasks onto a [`WorkflowEngine`] (spec §4.9):
//! `completion`, `planning`, `webSearch`, `writer`, `reflector`,
//! `refineQuery`, and `suggestions` share one injected `TextGenerator`;
//! `webSearch` additionally needs a `ToolInvoker`.

use std::sync::Arc;

use skein_core::{TextGenerator, ToolInvoker};
use skein_workflow::WorkflowEngine;

use crate::completion::build_completion_task;
use crate::planning::build_planning_task;
use crate::reflector::build_reflector_task;
use crate::refine_query::build_refine_query_task;
use crate::suggestions::build_suggestions_task;
use crate::web_search::build_web_search_task;
use crate::writer::build_writer_task;

const DEFAULT_MAX_REFLECTIONS: u32 = 2;

/// The capability injections and tuning knobs shared by the whole library.
pub struct TaskLibrary {
    generator: Arc<dyn TextGenerator>,
    tool_invoker: Arc<dyn ToolInvoker>,
    model: String,
    max_reflections: u32,
}

impl TaskLibrary {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, tool_invoker: Arc<dyn ToolInvoker>, model: impl Into<String>) -> Self {
        Self {
            generator,
            tool_invoker,
            model: model.into(),
            max_reflections: DEFAULT_MAX_REFLECTIONS,
        }
    }

    #[must_use]
    pub fn with_max_reflections(mut self, max_reflections: u32) -> Self {
        self.max_reflections = max_reflections;
        self
    }

    /// Registers every task. Re-registering on the same engine replaces
    /// each task definition wholesale, same as any other `engine.task(..)`
    /// call.
    pub fn register(&self, engine: &WorkflowEngine) {
        engine
            .task(build_completion_task())
            .task(build_planning_task(self.generator.clone(), self.model.clone()))
            .task(build_web_search_task(self.tool_invoker.clone()))
            .task(build_writer_task(self.generator.clone(), self.model.clone()))
            .task(build_reflector_task(self.generator.clone(), self.model.clone(), self.max_reflections))
            .task(build_refine_query_task(self.generator.clone(), self.model.clone()))
            .task(build_suggestions_task(self.generator.clone(), self.model.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use skein_core::{GenerateTextError, GenerateTextRequest, ToolError};
    use skein_persistence::InMemoryPersistence;
    use skein_workflow::WorkflowConfig;

    struct NoopGenerator;
    #[async_trait]
    impl TextGenerator for NoopGenerator {
        async fn generate_text(&self, _request: GenerateTextRequest) -> Result<String, GenerateTextError> {
            Ok("SUFFICIENT".to_string())
        }
    }

    struct NoopTools;
    #[async_trait]
    impl ToolInvoker for NoopTools {
        async fn invoke(&self, _name: &str, _args: Value) -> Result<Value, ToolError> {
            Ok(Value::Array(Vec::new()))
        }
    }

    #[test]
    fn register_adds_all_seven_task_names() {
        let engine = WorkflowEngine::new(Arc::new(InMemoryPersistence::new()), WorkflowConfig::default());
        let library = TaskLibrary::new(Arc::new(NoopGenerator), Arc::new(NoopTools), "test-model");
        library.register(&engine);

        for name in ["completion", "planning", "webSearch", "writer", "reflector", "refineQuery", "suggestions"] {
            assert!(engine.has_task(&skein_core::TaskName::new(name)), "missing task: {name}");
        }
    }
}
