//! The two capabilities the core consumes but never implements (spec §1,
//! §6): text generation from a large language model, and invocation of a
//! named tool. Kept here rather than in `skein-tasks` or `skein-agent-graph`
//! because both depend on them equally — the agent graph's
//! `processAgentMessage`/`processReasoningStep` and the task library's
//! `writer`/`planning`/`web-search` tasks all call through the same two
//! trait objects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// One message in a chat-style prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Callback invoked once per streamed token/delta, with `(chunk, fullText)`
/// — the Rust analogue of the spec's `onChunk(chunk, fullText)`.
pub type ChunkCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Callback invoked once per reasoning-trace delta, same shape as
/// [`ChunkCallback`].
pub type ReasoningCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

/// A `generateText` invocation (spec §6).
pub struct GenerateTextRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub prompt: String,
    pub signal: CancellationToken,
    pub on_chunk: Option<ChunkCallback>,
    pub on_reasoning: Option<ReasoningCallback>,
}

impl GenerateTextRequest {
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, signal: CancellationToken) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            prompt: prompt.into(),
            signal,
            on_chunk: None,
            on_reasoning: None,
        }
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages = messages;
        self
    }

    #[must_use]
    pub fn with_on_chunk(mut self, cb: ChunkCallback) -> Self {
        self.on_chunk = Some(cb);
        self
    }

    #[must_use]
    pub fn with_on_reasoning(mut self, cb: ReasoningCallback) -> Self {
        self.on_reasoning = Some(cb);
        self
    }
}

/// Error from a [`TextGenerator`].
#[derive(Debug, thiserror::Error)]
pub enum GenerateTextError {
    #[error("text generation cancelled")]
    Cancelled,
    #[error("provider error: {0}")]
    Provider(String),
}

/// Error from a [`ToolInvoker`].
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool invocation failed: {0}")]
    InvocationFailed(String),
}

/// The LLM capability the core consumes (spec §1's `generateText`, §6). No
/// concrete provider adapter is implemented here — only fakes in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, request: GenerateTextRequest) -> Result<String, GenerateTextError>;
}

/// The tool-invocation capability the core consumes (spec §1, §6). Tools
/// are named functions; no concrete tool is implemented here.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate_text(&self, request: GenerateTextRequest) -> Result<String, GenerateTextError> {
            if request.signal.is_cancelled() {
                return Err(GenerateTextError::Cancelled);
            }
            if let Some(cb) = &request.on_chunk {
                cb(&request.prompt, &request.prompt);
            }
            Ok(request.prompt)
        }
    }

    #[tokio::test]
    async fn text_generator_invokes_on_chunk() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let request = GenerateTextRequest::new("test-model", "hello", CancellationToken::new())
            .with_on_chunk(Box::new(move |_chunk, _full| {
                calls2.fetch_add(1, Ordering::SeqCst);
            }));

        let result = EchoGenerator.generate_text(request).await.unwrap();
        assert_eq!(result, "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn text_generator_respects_cancellation_signal() {
        let signal = CancellationToken::new();
        signal.cancel();
        let request = GenerateTextRequest::new("test-model", "hello", signal);
        let err = EchoGenerator.generate_text(request).await.unwrap_err();
        assert!(matches!(err, GenerateTextError::Cancelled));
    }

    struct EchoTool;

    #[async_trait]
    impl ToolInvoker for EchoTool {
        async fn invoke(&self, name: &str, args: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            if name != "echo" {
                return Err(ToolError::UnknownTool(name.to_string()));
            }
            Ok(args)
        }
    }

    #[tokio::test]
    async fn tool_invoker_rejects_unknown_tool() {
        let err = EchoTool.invoke("search", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(n) if n == "search"));
    }

    #[tokio::test]
    async fn tool_invoker_echoes_known_tool_args() {
        let result = EchoTool.invoke("echo", serde_json::json!({"q": "rust"})).await.unwrap();
        assert_eq!(result, serde_json::json!({"q": "rust"}));
    }
}
