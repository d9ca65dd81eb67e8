//! OpenAI Chat Completions API provider.
//!
//! Implements blocking (non-streaming) chat completions via the
//! `/v1/chat/completions` API. Also serves as the base for OpenRouter,
//! Ollama, and other OpenAI-compatible providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use reagent_core::types::Message;

use crate::ModelProvider;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// API style — determines minor behavior differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStyle {
    OpenAi,
    OpenRouter,
    Ollama,
}

pub struct OpenAiProvider {
    pub base_url: String,
    pub api_style: ApiStyle,
    provider_id: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn openai(model: impl Into<String>, api_key: Option<String>, base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_style: ApiStyle::OpenAi,
            provider_id: "openai".into(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn openrouter(
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: Option<&str>,
    ) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(OPENROUTER_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_style: ApiStyle::OpenRouter,
            provider_id: "openrouter".into(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn ollama(model: impl Into<String>, base_url: Option<&str>) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(OLLAMA_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_style: ApiStyle::Ollama,
            provider_id: "ollama".into(),
            model: model.into(),
            api_key: None,
            client: reqwest::Client::new(),
        }
    }
}

// --- OpenAI request/response types ---

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stop: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.provider_id
    }

    async fn complete(&self, messages: &[Message], stop_sequence: &str) -> anyhow::Result<String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            stop: [stop_sequence],
        };

        debug!(model = %self.model, base_url = %self.base_url, n_messages = messages.len(), "Requesting completion");

        let mut req_builder = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("content-type", "application/json");

        // Auth differs by style
        if self.api_style != ApiStyle::Ollama {
            let key = self
                .api_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("no API key configured for {}", self.provider_id))?;
            req_builder = req_builder.header("authorization", format!("Bearer {key}"));
        }
        if self.api_style == ApiStyle::OpenRouter {
            req_builder = req_builder.header("HTTP-Referer", "https://github.com/Clemens865/reagent");
        }

        let response = req_builder.json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Completion API error {status}: {body}");
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("Completion API returned no choices"))?;

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reagent_core::types::Message;

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAiProvider::openai("gpt-4.1-mini", Some("sk-test".into()), None);
        assert_eq!(provider.id(), "openai");
        assert_eq!(provider.base_url, OPENAI_BASE_URL);
    }

    #[test]
    fn test_openrouter_provider_creation() {
        let provider = OpenAiProvider::openrouter("qwen", Some("sk".into()), None);
        assert_eq!(provider.id(), "openrouter");
        assert_eq!(provider.base_url, OPENROUTER_BASE_URL);
    }

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OpenAiProvider::ollama("llama3", None);
        assert_eq!(provider.id(), "ollama");
        assert_eq!(provider.base_url, OLLAMA_BASE_URL);
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let provider =
            OpenAiProvider::openai("m", Some("k".into()), Some("https://my-proxy.example.com/"));
        assert_eq!(provider.base_url, "https://my-proxy.example.com");
    }

    #[test]
    fn test_request_serialization_includes_stop() {
        let messages = vec![
            Message::system("You are an assistant."),
            Message::user("Task: 2+2?"),
        ];
        let body = ChatCompletionRequest {
            model: "gpt-4.1-mini",
            messages: &messages,
            stop: ["<end_code>"],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4.1-mini");
        assert_eq!(json["stop"][0], "<end_code>");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Task: 2+2?");
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"id":"chatcmpl-1","choices":[{"index":0,"message":{"role":"assistant","content":"Thought: easy\nSummary: compute"},"finish_reason":"stop"}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Thought: easy\nSummary: compute")
        );
    }

    #[test]
    fn test_response_without_choices() {
        let json = r#"{"id":"chatcmpl-1"}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
