//! Scripted providers that record every request instead of calling a network API.

use super::{ChatChunk, ChatCompletions, ChatRequest, ChunkStream, GenerateContent, GenerateRequest};
use anyhow::anyhow;
use futures_core::future::BoxFuture;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone)]
pub struct StubCompletions {
    fragments: Vec<String>,
    fail_with: Option<String>,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
}

impl StubCompletions {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Streams the fragments, then a chunk error.
    pub fn failing_after(fragments: &[&str], message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(fragments)
        }
    }

    pub fn calls(&self) -> Vec<ChatRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChatCompletions for StubCompletions {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn stream_chat(&self, req: ChatRequest) -> BoxFuture<'static, anyhow::Result<ChunkStream>> {
        self.calls.lock().unwrap().push(req);
        let mut items: Vec<anyhow::Result<ChatChunk>> = self
            .fragments
            .iter()
            .map(|t| Ok(ChatChunk { text: t.clone() }))
            .collect();
        if let Some(msg) = &self.fail_with {
            items.push(Err(anyhow!(msg.clone())));
        }

        Box::pin(async move { Ok(Box::pin(tokio_stream::iter(items)) as ChunkStream) })
    }
}

#[derive(Debug, Clone)]
pub struct StubGenerate {
    reply: Result<String, String>,
    calls: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl StubGenerate {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<GenerateRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl GenerateContent for StubGenerate {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn generate(&self, req: GenerateRequest) -> BoxFuture<'static, anyhow::Result<String>> {
        self.calls.lock().unwrap().push(req);
        let reply = self.reply.clone().map_err(|m| anyhow!(m));
        Box::pin(async move { reply })
    }
}
