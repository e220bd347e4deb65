use crate::provider;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// `config.toml`. API keys are never read from here; they are entered per session.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default model (optional); must be a catalog id.
    pub model: Option<String>,

    #[serde(default)]
    pub openai: ApiSection,

    #[serde(default)]
    pub google: ApiSection,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    /// Override the provider's API base URL (proxies, gateways).
    pub api_base: Option<String>,
}

impl Config {
    /// A missing file is `Ok(None)`; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text)
                .with_context(|| format!("failed to parse TOML: {}", path.display()))
                .map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read config: {}", path.display())),
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn openai_base(&self) -> &str {
        self.openai
            .api_base
            .as_deref()
            .unwrap_or(provider::openai::DEFAULT_API_BASE)
    }

    pub fn google_base(&self) -> &str {
        self.google
            .api_base
            .as_deref()
            .unwrap_or(provider::google::DEFAULT_API_BASE)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::provider;

    #[test]
    fn parses_model_and_api_bases() {
        let cfg = Config::parse(
            r#"
            model = "gemini-1.5-pro"

            [openai]
            api_base = "http://localhost:8080/v1"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(cfg.openai_base(), "http://localhost:8080/v1");
        assert_eq!(cfg.google_base(), provider::google::DEFAULT_API_BASE);
    }

    #[test]
    fn defaults_point_at_hosted_apis() {
        let cfg = Config::default();
        assert_eq!(cfg.openai_base(), provider::openai::DEFAULT_API_BASE);
        assert!(cfg.model.is_none());
    }

    #[test]
    fn api_key_in_config_is_rejected() {
        let err = Config::parse("[openai]\napi_key = \"sk-123\"\n").expect_err("keys are not configurable");
        assert!(format!("{err:#}").contains("api_key"));
    }

    #[test]
    fn missing_file_is_none() {
        let path = std::env::temp_dir().join(format!("chatbot-no-such-config-{}.toml", std::process::id()));
        assert!(Config::load(&path).unwrap().is_none());
    }

    #[test]
    fn bad_toml_names_the_file() {
        let path = std::env::temp_dir().join(format!("chatbot-bad-config-{}.toml", std::process::id()));
        std::fs::write(&path, "model = [").unwrap();
        let err = Config::load(&path).expect_err("invalid TOML");
        std::fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("failed to parse TOML"));
    }
}
