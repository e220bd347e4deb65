/// Which hosted API serves a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-style chat completions, streamed.
    OpenAi,
    /// Gemini `generateContent`, one-shot.
    Google,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
        }
    }
}

/// A selectable model and the provider that serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub id: &'static str,
    pub provider: ProviderKind,
}

/// Selector contents, in display order.
pub const CATALOG: [ModelEntry; 6] = [
    ModelEntry { id: "gpt-3.5-turbo", provider: ProviderKind::OpenAi },
    ModelEntry { id: "gpt-4", provider: ProviderKind::OpenAi },
    ModelEntry { id: "gpt-4-turbo", provider: ProviderKind::OpenAi },
    ModelEntry { id: "gemini-2.0-flash", provider: ProviderKind::Google },
    ModelEntry { id: "gemini-1.5-flash", provider: ProviderKind::Google },
    ModelEntry { id: "gemini-1.5-pro", provider: ProviderKind::Google },
];

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub fn ids() -> [&'static str; 6] {
    CATALOG.map(|m| m.id)
}

pub fn lookup(id: &str) -> Option<&'static ModelEntry> {
    CATALOG.iter().find(|m| m.id == id)
}

pub fn resolve(id: &str) -> anyhow::Result<&'static ModelEntry> {
    lookup(id).ok_or_else(|| {
        anyhow::anyhow!("unknown model: {id} (choose one of: {})", ids().join(", "))
    })
}
