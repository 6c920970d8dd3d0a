//! Event payloads the task library emits to the outer layer (spec §6:
//! `answer: {text, finalText?, status}` and `sources`).

use serde::{Deserialize, Serialize};
use skein_eventbus::ChannelKey;

/// `"PENDING"` while the answer is still streaming, `"COMPLETED"` once
/// `completion` assembles the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnswerStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub text: String,
    pub final_text: Option<String>,
    pub status: AnswerStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceItem {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

pub static ANSWER: ChannelKey<AnswerEvent> = ChannelKey::new("answer");
pub static SOURCES_EVENT: ChannelKey<Vec<SourceItem>> = ChannelKey::new("sources");
