use crate::transcript::Turn;
use futures_core::future::BoxFuture;
use futures_core::stream::BoxStream;
use std::fmt;

pub mod google;
pub mod openai;
mod sse;

#[cfg(test)]
pub mod stub;
#[cfg(test)]
pub(crate) mod testing;

/// Streaming chat-completions call: the whole conversation goes out.
#[derive(Clone)]
pub struct ChatRequest {
    pub api_key: String,
    pub model: String,
    pub messages: Vec<Turn>,
}

/// One-shot generation call: only the current prompt goes out.
#[derive(Clone)]
pub struct GenerateRequest {
    pub api_key: String,
    pub model: String,
    pub prompt: String,
}

impl fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatRequest")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("messages", &self.messages)
            .finish()
    }
}

impl fmt::Debug for GenerateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("prompt", &self.prompt)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ChatChunk {
    pub text: String,
}

pub type ChunkStream = BoxStream<'static, anyhow::Result<ChatChunk>>;

/// OpenAI-style client.
pub trait ChatCompletions {
    fn name(&self) -> &'static str;

    /// Start streaming a reply. Concatenated chunk texts form the full reply.
    fn stream_chat(&self, req: ChatRequest) -> BoxFuture<'static, anyhow::Result<ChunkStream>>;
}

/// Gemini-style client.
pub trait GenerateContent {
    fn name(&self) -> &'static str;

    fn generate(&self, req: GenerateRequest) -> BoxFuture<'static, anyhow::Result<String>>;
}

/// Normalize an API base so `Url::join` appends instead of replacing the last segment.
pub(crate) fn api_base(raw: &str) -> anyhow::Result<reqwest::Url> {
    let mut s = raw.trim().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    reqwest::Url::parse(&s).map_err(|e| anyhow::anyhow!("invalid API base {raw:?}: {e}"))
}
