use skein_core::{GenerateTextError, NodeName, ToolError};

/// Errors surfaced while walking the agent graph.
#[derive(Debug, thiserror::Error)]
pub enum AgentGraphError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeName),
    #[error("text generation failed for node {node}: {source}")]
    Generation {
        node: NodeName,
        #[source]
        source: GenerateTextError,
    },
    #[error("tool invocation failed for node {node}: {source}")]
    Tool {
        node: NodeName,
        #[source]
        source: ToolError,
    },
    #[error("graph execution cancelled")]
    Cancelled,
}
