//! LLM client for short text summaries.
//!
//! Talks to any OpenAI-compatible chat-completions API.

mod config;
mod prompts;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use config::{LlmConfig, LlmProvider};

/// LLM client for summarization.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Chat-completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat-completions response format.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is reachable.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        let url = format!("{}/v1/models", self.config.endpoint);
        let mut req = self.client.get(&url);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }
        match req.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Summarize `text` with the configured prompt.
    pub async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let truncated = self.truncate_content(text);
        let prompt = self
            .config
            .get_summary_prompt()
            .replace("{content}", truncated);

        debug!("Summarizing {} chars with {}", truncated.len(), self.config.model);
        let response = self.call_chat(&prompt).await?;

        let summary = response.trim().to_string();
        if summary.is_empty() {
            return Err(LlmError::Provider("Empty summary response".to_string()));
        }

        Ok(summary)
    }

    /// Truncate content to configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Send a single user-role message and return the first choice's content.
    async fn call_chat(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let mut req = self.client.post(&url).json(&request);
        if let Some(ref key) = self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Provider(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("malformed response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Provider("Response contained no choices".to_string()))
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to reach the LLM service or read its response
    #[error("Transport error: {0}")]
    Transport(String),
    /// The API answered with an error or an unusable completion
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("LLM is disabled")]
    Disabled,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LlmClient {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::base_default()
        }
        .with_endpoint(&server.uri());
        LlmClient::new(config).unwrap()
    }

    #[test]
    fn test_truncate_content_respects_char_boundaries() {
        let config = LlmConfig {
            max_content_chars: 4,
            ..LlmConfig::base_default()
        };
        let client = LlmClient::new(config).unwrap();

        assert_eq!(client.truncate_content("abc"), "abc");
        assert_eq!(client.truncate_content("abcdef"), "abcd");
        // 'é' is two bytes and straddles the limit
        assert_eq!(client.truncate_content("abcé"), "abc");
    }

    #[tokio::test]
    async fn test_summarize_sends_single_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 1000,
                "messages": [{
                    "role": "user",
                    "content": "Please summarize the provided text in less than 30 characters: hello world"
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "  Greeting  "}, "finish_reason": "stop"},
                    {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(&server).summarize("hello world").await.unwrap();
        assert_eq!(summary, "Greeting");
    }

    #[tokio::test]
    async fn test_summarize_api_error_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached", "type": "requests"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("hello").await.unwrap_err();
        match err {
            LlmError::Provider(msg) => assert!(msg.contains("429")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_summarize_no_choices_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).summarize("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Provider(_)));
    }

    #[tokio::test]
    async fn test_summarize_disabled() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::base_default()
        };
        let client = LlmClient::new(config).unwrap();

        assert!(matches!(
            client.summarize("hello").await,
            Err(LlmError::Disabled)
        ));
        assert!(!client.is_available().await);
    }

    #[tokio::test]
    async fn test_is_available_probes_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        assert!(client_for(&server).is_available().await);
    }
}
