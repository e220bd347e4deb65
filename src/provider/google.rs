use super::{GenerateContent, GenerateRequest};
use anyhow::{anyhow, Context};
use futures_core::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/";

#[derive(Debug, Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    api_base: Url,
}

impl GoogleProvider {
    pub fn new(http: reqwest::Client, api_base: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http,
            api_base: super::api_base(api_base)?,
        })
    }

    fn build_url(&self, model: &str, api_key: &str) -> anyhow::Result<Url> {
        // Non-streaming variant; the whole reply comes back in one JSON body.
        // Docs: https://ai.google.dev/api/rest/v1beta/models/generateContent
        let mut url = self
            .api_base
            .join(&format!("v1beta/models/{model}:generateContent"))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

impl GenerateContent for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn generate(&self, req: GenerateRequest) -> BoxFuture<'static, anyhow::Result<String>> {
        let this = self.clone();

        Box::pin(async move {
            let url = this.build_url(&req.model, &req.api_key)?;
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

            let body = GenerateContentRequest {
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![Part { text: Some(req.prompt) }],
                }],
            };

            let resp = this
                .http
                .post(url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .context("failed to send Gemini request")?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(anyhow!("Gemini API error: HTTP {status}: {text}"));
            }

            let parsed: GenerateContentResponse = resp
                .json()
                .await
                .context("failed to parse Gemini response JSON")?;

            reply_text(parsed)
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

fn reply_text(r: GenerateContentResponse) -> anyhow::Result<String> {
    // Concatenate all text parts of the first candidate.
    let text: String = r
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    match r.prompt_feedback.and_then(|f| f.block_reason) {
        Some(reason) => Err(anyhow!("Gemini returned no text (prompt blocked: {reason})")),
        None => Err(anyhow!("Gemini returned no text")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::serve_once;

    #[tokio::test]
    async fn sends_only_the_prompt_and_joins_parts() {
        let reply = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hi "}, {"text": "there"}]},
                "finishReason": "STOP"
            }]
        });
        let (base, server) = serve_once("200 OK", "application/json", reply.to_string());

        let p = GoogleProvider::new(reqwest::Client::new(), &base).unwrap();
        let text = p
            .generate(GenerateRequest {
                api_key: "AIza-test".to_string(),
                model: "gemini-1.5-flash".to_string(),
                prompt: "Hello".to_string(),
            })
            .await
            .expect("generate should succeed");
        assert_eq!(text, "Hi there");

        let captured = server.join().expect("server thread should join");
        assert_eq!(
            captured.request_line,
            "POST /v1beta/models/gemini-1.5-flash:generateContent?key=AIza-test HTTP/1.1"
        );
        assert_eq!(
            captured.json(),
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}]
            })
        );
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let (base, server) = serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"error":{"message":"API key not valid"}}"#.to_string(),
        );

        let p = GoogleProvider::new(reqwest::Client::new(), &base).unwrap();
        let err = p
            .generate(GenerateRequest {
                api_key: "nope".to_string(),
                model: "gemini-1.5-pro".to_string(),
                prompt: "Hello".to_string(),
            })
            .await
            .expect_err("400 should fail");
        let msg = format!("{err:#}");
        assert!(msg.contains("HTTP 400"), "unexpected message: {msg}");
        assert!(msg.contains("API key not valid"), "unexpected message: {msg}");
        server.join().expect("server thread should join");
    }

    #[test]
    fn blocked_prompt_names_the_reason() {
        let r: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        let msg = format!("{:#}", reply_text(r).expect_err("no candidates"));
        assert!(msg.contains("SAFETY"), "unexpected message: {msg}");
    }
}
