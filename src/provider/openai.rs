use super::sse::SseParser;
use super::{ChatChunk, ChatCompletions, ChatRequest, ChunkStream};
use crate::transcript::Turn;
use anyhow::{anyhow, Context};
use futures_core::future::BoxFuture;
use futures_core::stream::BoxStream;
use futures_core::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use tokio_stream::StreamExt;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1/";

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_base: Url,
}

impl OpenAiProvider {
    pub fn new(http: reqwest::Client, api_base: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            api_base: super::api_base(api_base)?,
        })
    }

    fn build_url(&self) -> anyhow::Result<Url> {
        Ok(self.api_base.join("chat/completions")?)
    }

    fn headers(api_key: &str) -> anyhow::Result<HeaderMap> {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut v = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| anyhow!("API key contains characters not allowed in a header"))?;
        v.set_sensitive(true);
        h.insert(AUTHORIZATION, v);
        Ok(h)
    }
}

impl ChatCompletions for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn stream_chat(&self, req: ChatRequest) -> BoxFuture<'static, anyhow::Result<ChunkStream>> {
        let this = self.clone();

        Box::pin(async move {
            let url = this.build_url()?;
            let headers = Self::headers(&req.api_key)?;

            let body = ChatCompletionRequest {
                model: &req.model,
                messages: &req.messages,
                stream: true,
            };

            let resp = this
                .http
                .post(url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .context("failed to start OpenAI request")?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(anyhow!("OpenAI API error: HTTP {status}: {text}"));
            }

            let bytes = resp.bytes_stream().map(|r| r.map(|b| b.to_vec()));
            let stream = CompletionStream {
                body: Box::pin(bytes),
                parser: SseParser::new(),
                pending: VecDeque::new(),
                finished: false,
            };
            Ok(Box::pin(stream) as ChunkStream)
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

enum Decoded {
    Text(String),
    Skip,
    Done,
}

fn decode_data(data: &str) -> anyhow::Result<Decoded> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Decoded::Done);
    }
    if data.is_empty() {
        return Ok(Decoded::Skip);
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).context("failed to parse SSE JSON")?;
    if let Some(err) = chunk.error {
        return Err(anyhow!("OpenAI stream error: {}", err.message));
    }

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .unwrap_or_default();
    if text.is_empty() {
        Ok(Decoded::Skip)
    } else {
        Ok(Decoded::Text(text))
    }
}

/// Turns the SSE body into text chunks, polled on the caller's task.
struct CompletionStream {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    parser: SseParser,
    pending: VecDeque<anyhow::Result<ChatChunk>>,
    finished: bool,
}

impl CompletionStream {
    fn absorb(&mut self, events: Vec<anyhow::Result<String>>) {
        for ev in events {
            match ev.and_then(|data| decode_data(&data)) {
                Ok(Decoded::Text(text)) => self.pending.push_back(Ok(ChatChunk { text })),
                Ok(Decoded::Skip) => {}
                Ok(Decoded::Done) => {
                    self.finished = true;
                    return;
                }
                Err(e) => {
                    self.pending.push_back(Err(e));
                    self.finished = true;
                    return;
                }
            }
        }
    }
}

impl Stream for CompletionStream {
    type Item = anyhow::Result<ChatChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let events = this.parser.push(&bytes);
                    this.absorb(events);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(anyhow!(e).context("network stream error"))));
                }
                Poll::Ready(None) => {
                    let events = this.parser.finish();
                    this.absorb(events);
                    this.finished = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
