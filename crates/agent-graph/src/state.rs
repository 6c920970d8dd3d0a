//! The graph's `executionState` (spec §4.7): accumulated per-node results,
//! completion markers, and lifecycle status, read by condition/reduce/loop
//! handlers and by the outer layer's status events.

use std::collections::{HashMap, HashSet};

use skein_core::NodeName;

use crate::node::NodeStatus;

/// Per-run state shared by every node and edge handler in one graph walk.
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    results: HashMap<NodeName, String>,
    completed: HashSet<NodeName>,
    node_states: HashMap<NodeName, NodeStatus>,
}

impl ExecutionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_result(&mut self, node: NodeName, result: String) {
        self.results.insert(node, result);
    }

    #[must_use]
    pub fn result(&self, node: &NodeName) -> Option<&String> {
        self.results.get(node)
    }

    #[must_use]
    pub fn results_snapshot(&self) -> HashMap<NodeName, String> {
        self.results.clone()
    }

    pub fn mark_completed(&mut self, node: NodeName) {
        self.completed.insert(node);
    }

    #[must_use]
    pub fn is_completed(&self, node: &NodeName) -> bool {
        self.completed.contains(node)
    }

    pub fn set_status(&mut self, node: NodeName, status: NodeStatus) {
        self.node_states.insert(node, status);
    }

    #[must_use]
    pub fn status(&self, node: &NodeName) -> Option<NodeStatus> {
        self.node_states.get(node).copied()
    }
}
