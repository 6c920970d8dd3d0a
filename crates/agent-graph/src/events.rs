//! Channels the graph emits on, observed by the outer UI layer (spec §4.7,
//! §6: node status, streamed answer chunks, streamed reasoning chunks).

use serde::{Deserialize, Serialize};
use skein_core::NodeName;
use skein_eventbus::ChannelKey;

use crate::node::{NodeStatus, OutputMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusEvent {
    pub node: NodeName,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeChunkEvent {
    pub node: NodeName,
    pub chunk: String,
    pub full_text: String,
    pub output_mode: OutputMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeReasoningEvent {
    pub node: NodeName,
    pub chunk: String,
    pub full_text: String,
}

/// Node lifecycle transitions (`pending`, `reasoning`, `completed`, `failed`).
pub static NODE_STATUS: ChannelKey<NodeStatusEvent> = ChannelKey::new("nodeStatus");

/// Streamed answer/step content (spec §6's `answer`/`step` channels, unified
/// here and disambiguated by `output_mode`).
pub static NODE_CHUNK: ChannelKey<NodeChunkEvent> = ChannelKey::new("nodeChunk");

/// Streamed reasoning-trace content.
pub static NODE_REASONING: ChannelKey<NodeReasoningEvent> = ChannelKey::new("nodeReasoning");
