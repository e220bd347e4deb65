use crate::models::{self, ModelEntry, ProviderKind};
use crate::provider::{ChatCompletions, ChatRequest, ChunkStream, GenerateContent, GenerateRequest};
use crate::transcript::{Role, Transcript, Turn};
use std::fmt;
use tokio_stream::StreamExt;

pub const MISSING_KEY_NOTICE: &str = "Please add your API key to continue.";

/// Where turns and notices get drawn.
pub trait Surface {
    fn notice(&mut self, text: &str) -> anyhow::Result<()>;

    fn render_turn(&mut self, turn: &Turn) -> anyhow::Result<()>;

    fn begin_stream(&mut self, role: Role) -> anyhow::Result<()>;

    fn render_fragment(&mut self, text: &str) -> anyhow::Result<()>;

    fn end_stream(&mut self) -> anyhow::Result<()>;
}

/// The two clients a turn can be routed to.
pub struct Backends {
    pub completions: Box<dyn ChatCompletions + Send + Sync>,
    pub generative: Box<dyn GenerateContent + Send + Sync>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No key; the notice was shown and nothing else happened.
    NeedsKey,
    /// Blank prompt; nothing happened.
    Ignored,
    /// `[user, assistant]` was appended.
    Replied,
}

/// Draw a stream as it arrives and return the assembled text.
pub async fn render_incremental<S: Surface + ?Sized>(
    surface: &mut S,
    role: Role,
    mut stream: ChunkStream,
) -> anyhow::Result<String> {
    surface.begin_stream(role)?;
    let mut text = String::new();
    while let Some(item) = stream.next().await {
        let chunk = item?;
        surface.render_fragment(&chunk.text)?;
        text.push_str(&chunk.text);
    }
    surface.end_stream()?;
    Ok(text)
}

/// Run one exchange. The transcript goes in by value and always comes back.
///
/// The user turn is committed before the provider is called, so it survives a
/// failed call and is part of the next OpenAI request. Client errors propagate
/// as-is; there is no retry and no fallback between providers.
pub async fn take_turn(
    transcript: Transcript,
    api_key: Option<&str>,
    model: &ModelEntry,
    prompt: &str,
    backends: &Backends,
    surface: &mut dyn Surface,
) -> (Transcript, anyhow::Result<Outcome>) {
    let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
        let shown = surface.notice(MISSING_KEY_NOTICE);
        return (transcript, shown.map(|()| Outcome::NeedsKey));
    };

    if prompt.trim().is_empty() {
        return (transcript, Ok(Outcome::Ignored));
    }

    tracing::info!(
        model = model.id,
        provider = model.provider.as_str(),
        prior_turns = transcript.len(),
        "dispatching turn"
    );

    let transcript = transcript.appending(Turn::user(prompt));
    match request_reply(&transcript, api_key, model, prompt, backends, surface).await {
        Ok(reply) => {
            tracing::debug!(reply_len = reply.len(), "turn complete");
            (transcript.appending(Turn::assistant(reply)), Ok(Outcome::Replied))
        }
        Err(e) => (transcript, Err(e)),
    }
}

/// `transcript` already ends with the user turn for `prompt`.
async fn request_reply(
    transcript: &Transcript,
    api_key: &str,
    model: &ModelEntry,
    prompt: &str,
    backends: &Backends,
    surface: &mut dyn Surface,
) -> anyhow::Result<String> {
    if let Some(user) = transcript.turns().last() {
        surface.render_turn(user)?;
    }

    match model.provider {
        ProviderKind::OpenAi => {
            let req = ChatRequest {
                api_key: api_key.to_string(),
                model: model.id.to_string(),
                messages: transcript.turns().to_vec(),
            };
            let stream = backends.completions.stream_chat(req).await?;
            render_incremental(surface, Role::Assistant, stream).await
        }
        ProviderKind::Google => {
            // Prior turns are deliberately not forwarded on this path.
            let req = GenerateRequest {
                api_key: api_key.to_string(),
                model: model.id.to_string(),
                prompt: prompt.to_string(),
            };
            let text = backends.generative.generate(req).await?;
            surface.render_turn(&Turn::assistant(text.as_str()))?;
            Ok(text)
        }
    }
}

/// Per-session state: one transcript, the selected model and a transient key.
#[derive(Clone)]
pub struct Session {
    transcript: Transcript,
    model: &'static ModelEntry,
    api_key: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("transcript", &self.transcript)
            .field("model", &self.model.id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Session {
    pub fn new(model: &'static ModelEntry, api_key: Option<String>) -> Self {
        let mut s = Self {
            transcript: Transcript::new(),
            model,
            api_key: None,
        };
        if let Some(key) = api_key {
            s.set_api_key(&key);
        }
        s
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn model(&self) -> &'static ModelEntry {
        self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Blank input clears the key.
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
    }

    /// Switch models; the transcript carries over.
    pub fn select_model(&mut self, id: &str) -> anyhow::Result<()> {
        self.model = models::resolve(id)?;
        Ok(())
    }

    /// Same as a page reload: the transcript starts over.
    pub fn reset(&mut self) {
        self.transcript = Transcript::new();
    }

    pub fn replay(&self, surface: &mut dyn Surface) -> anyhow::Result<()> {
        for turn in self.transcript.turns() {
            surface.render_turn(turn)?;
        }
        Ok(())
    }

    /// Run a turn and keep whatever transcript it hands back, even on error.
    pub async fn submit(
        &mut self,
        prompt: &str,
        backends: &Backends,
        surface: &mut dyn Surface,
    ) -> anyhow::Result<Outcome> {
        let (transcript, outcome) = take_turn(
            self.transcript.clone(),
            self.api_key.as_deref(),
            self.model,
            prompt,
            backends,
            surface,
        )
        .await;
        self.transcript = transcript;
        outcome
    }
}
