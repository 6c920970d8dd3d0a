//! A node in the agent graph (spec §4.7): a named LLM role with its own
//! system prompt and, optionally, a reasoning pre-step and bound tools.

use skein_core::NodeName;

/// One vertex of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: NodeName,
    pub role: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub tool_steps: Option<u32>,
    pub tools: Option<Vec<String>>,
    pub enable_reasoning: bool,
    /// Marks a node that represents a discrete step in the outer
    /// `step: {stepId, stepStatus, ...}` event stream (spec §6), as
    /// opposed to an internal helper node.
    pub is_step: bool,
}

impl Node {
    #[must_use]
    pub fn new(name: NodeName, role: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            name,
            role: role.into(),
            system_prompt: system_prompt.into(),
            temperature: None,
            tool_steps: None,
            tools: None,
            enable_reasoning: false,
            is_step: false,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_tool_steps(mut self, steps: u32) -> Self {
        self.tool_steps = Some(steps);
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = Some(tools);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self) -> Self {
        self.enable_reasoning = true;
        self
    }

    #[must_use]
    pub fn as_step(mut self) -> Self {
        self.is_step = true;
        self
    }
}

/// Lifecycle status of a node within one graph execution (spec §4.7's
/// `events` emitter: `pending`, `reasoning`, `completed`, `failed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Reasoning,
    Completed,
    Failed,
}

/// Which outer event channel a streamed chunk belongs to (spec §6:
/// `answer` vs `step`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Answer,
    Step,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let node = Node::new(NodeName::new("writer"), "writer", "You write answers.")
            .with_temperature(0.7)
            .with_tool_steps(3)
            .with_tools(vec!["search".to_string()])
            .with_reasoning()
            .as_step();

        assert_eq!(node.temperature, Some(0.7));
        assert_eq!(node.tool_steps, Some(3));
        assert_eq!(node.tools, Some(vec!["search".to_string()]));
        assert!(node.enable_reasoning);
        assert!(node.is_step);
    }

    #[test]
    fn builder_defaults_are_minimal() {
        let node = Node::new(NodeName::new("planner"), "planner", "Plan the task.");
        assert_eq!(node.temperature, None);
        assert!(!node.enable_reasoning);
        assert!(!node.is_step);
    }
}
