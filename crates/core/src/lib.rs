//! # skein-core
//!
//! Shared identifiers used by every other Skein crate: [`WorkflowId`],
//! [`ExecutionId`], [`BreakpointId`], [`NodeId`], plus the [`TaskName`] and
//! [`NodeName`] newtypes used as registry keys and routing destinations.
//! Also hosts the [`TextGenerator`]/[`ToolInvoker`] capability traits that
//! the agent graph and task library both depend on but neither owns.

mod capability;
mod id;

pub use capability::{
    ChatMessage, ChunkCallback, GenerateTextError, GenerateTextRequest, ReasoningCallback, TextGenerator, ToolError,
    ToolInvoker,
};
pub use id::{BreakpointId, ExecutionId, NodeId, NodeName, TaskName, UuidParseError, WorkflowId};
