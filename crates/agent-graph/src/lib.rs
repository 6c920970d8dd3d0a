//! # skein-agent-graph
//!
//! The node/edge graph executor for multi-agent LLM workflows (spec §4.7,
//! §4.8): a node registry, an edge registry keyed by traversal pattern
//! (sequential, parallel, condition, map, reduce, loop, revision), and the
//! `executeNode` walk that drives one node's LLM call and then dispatches
//! its outgoing edges. Built atop the `TextGenerator`/`ToolInvoker`
//! capability traits of `skein-core` and the publish/subscribe channel
//! model of `skein-eventbus`.

mod edge;
mod error;
mod events;
mod graph;
mod node;
mod state;

pub use edge::{
    ConditionFn, Edge, EdgeConfig, EdgePattern, GraphView, InputTransformFn, OutputTransformFn, RevisionPromptFn,
    StopCondition, StopPredicateFn,
};
pub use error::AgentGraphError;
pub use events::{NodeChunkEvent, NodeReasoningEvent, NodeStatusEvent, NODE_CHUNK, NODE_REASONING, NODE_STATUS};
pub use graph::AgentGraph;
pub use node::{Node, NodeStatus, OutputMode};
pub use state::ExecutionState;
