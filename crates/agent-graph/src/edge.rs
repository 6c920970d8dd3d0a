//! Edges and their per-pattern configuration (spec §4.8).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use skein_core::NodeName;

/// A view of the graph's accumulated results, passed to condition and
/// revision-prompt callbacks as `{response, nodes}` (spec §4.8).
#[derive(Debug, Clone)]
pub struct GraphView {
    pub response: String,
    pub nodes: HashMap<NodeName, String>,
}

pub type ConditionFn = Arc<dyn Fn(&GraphView) -> bool + Send + Sync>;
pub type InputTransformFn = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;
pub type OutputTransformFn = Arc<dyn Fn(&[String]) -> String + Send + Sync>;
pub type RevisionPromptFn = Arc<dyn Fn(&GraphView) -> String + Send + Sync>;
pub type StopPredicateFn = Arc<dyn Fn(&str) -> BoxFuture<'static, bool> + Send + Sync>;

/// Halting condition shared by the `loop` and `revision` patterns and by
/// `AgentGraph::should_stop` directly (spec §4.7: "a user-supplied
/// predicate (possibly async) or a fixed threshold").
#[derive(Clone)]
pub enum StopCondition {
    Predicate(StopPredicateFn),
    /// Halts once the current response reaches this length. The spec names
    /// a "fixed threshold" without defining what it measures; response
    /// length is the only scalar available at the call site.
    LengthThreshold(usize),
}

impl StopCondition {
    pub async fn evaluate(&self, current_response: &str) -> bool {
        match self {
            StopCondition::Predicate(predicate) => predicate(current_response).await,
            StopCondition::LengthThreshold(threshold) => current_response.len() >= *threshold,
        }
    }
}

impl std::fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopCondition::Predicate(_) => f.write_str("StopCondition::Predicate(..)"),
            StopCondition::LengthThreshold(n) => f.debug_tuple("StopCondition::LengthThreshold").field(n).finish(),
        }
    }
}

/// The traversal pattern for one edge or group of edges (spec §4.8 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePattern {
    Sequential,
    Parallel,
    Condition,
    Map,
    Reduce,
    Loop,
    Revision,
}

/// Per-edge knobs. Only the fields relevant to an edge's `pattern` are
/// consulted; the rest are ignored (spec §4.8 describes each pattern's
/// config independently).
#[derive(Clone, Default)]
pub struct EdgeConfig {
    /// `sequential`: ascending sort key.
    pub priority: i32,
    /// `condition`: `condition({response, nodes})`.
    pub condition: Option<ConditionFn>,
    /// `map`: splits the source response into elements; defaults to a
    /// single-element vector of the whole response.
    pub input_transform: Option<InputTransformFn>,
    /// `map`/`reduce`/`loop`: combines a list of outputs; defaults to
    /// newline-joining (double-newline for `loop`).
    pub output_transform: Option<OutputTransformFn>,
    /// `loop`/`revision`: iteration cap.
    pub max_iterations: usize,
    /// `loop`/`revision`: early-halt check.
    pub stop_condition: Option<StopCondition>,
    /// `revision`: `revisionPrompt({response, nodes})`; defaults to the
    /// previous output verbatim.
    pub revision_prompt: Option<RevisionPromptFn>,
    /// Destination to route to instead, on any pattern, if execution of
    /// this edge's destination fails (`withFallback`, spec §4.7/§4.8).
    pub fallback: Option<NodeName>,
}

impl EdgeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_iterations: 1,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ConditionFn) -> Self {
        self.condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_input_transform(mut self, transform: InputTransformFn) -> Self {
        self.input_transform = Some(transform);
        self
    }

    #[must_use]
    pub fn with_output_transform(mut self, transform: OutputTransformFn) -> Self {
        self.output_transform = Some(transform);
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_stop_condition(mut self, stop_condition: StopCondition) -> Self {
        self.stop_condition = Some(stop_condition);
        self
    }

    #[must_use]
    pub fn with_revision_prompt(mut self, prompt: RevisionPromptFn) -> Self {
        self.revision_prompt = Some(prompt);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: NodeName) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// One edge of the graph: `from` feeds `to` according to `pattern`.
#[derive(Clone)]
pub struct Edge {
    pub from: NodeName,
    pub to: NodeName,
    pub pattern: EdgePattern,
    pub config: EdgeConfig,
}

impl Edge {
    #[must_use]
    pub fn new(from: NodeName, to: NodeName, pattern: EdgePattern) -> Self {
        Self {
            from,
            to,
            pattern,
            config: EdgeConfig::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EdgeConfig) -> Self {
        self.config = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn length_threshold_stop_condition_evaluates() {
        let stop = StopCondition::LengthThreshold(5);
        assert!(!stop.evaluate("hi").await);
        assert!(stop.evaluate("hello!").await);
    }

    #[tokio::test]
    async fn predicate_stop_condition_evaluates() {
        let stop = StopCondition::Predicate(Arc::new(|response: &str| {
            let done = response.contains("DONE");
            Box::pin(async move { done })
        }));
        assert!(!stop.evaluate("still working").await);
        assert!(stop.evaluate("DONE").await);
    }

    #[test]
    fn edge_config_defaults_to_single_iteration() {
        let config = EdgeConfig::new();
        assert_eq!(config.max_iterations, 1);
        assert_eq!(config.priority, 0);
        assert!(config.fallback.is_none());
    }
}
