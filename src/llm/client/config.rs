//! LLM client configuration.

use serde::{Deserialize, Serialize};

use super::prompts::DEFAULT_SUMMARY_PROMPT;

/// LLM provider type.
///
/// Every provider speaks the OpenAI chat-completions API; the variant only
/// picks the default endpoint and API key variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// api.openai.com (default)
    #[default]
    OpenAI,
    /// Groq's OpenAI-compatible endpoint
    Groq,
    /// Together.ai
    Together,
    /// Any other OpenAI-compatible server (set `endpoint`)
    Custom,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "groq" => Some(Self::Groq),
            "together" => Some(Self::Together),
            "custom" | "local" => Some(Self::Custom),
            _ => None,
        }
    }

    /// Default API base for the provider.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com",
            Self::Groq => "https://api.groq.com/openai",
            Self::Together => "https://api.together.xyz",
            Self::Custom => "http://localhost:8080",
        }
    }

    /// Provider-specific API key environment variable, if any.
    fn key_var(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Together | Self::Custom => None,
        }
    }
}

/// Configuration for LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether LLM summarization is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub provider: LlmProvider,
    /// API base URL; `/v1/chat/completions` is appended
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Custom summary prompt (uses the {content} placeholder)
    #[serde(default)]
    pub summary_prompt: Option<String>,
    /// Maximum characters of text to send to the LLM
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    LlmProvider::default().default_endpoint().to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_content_chars() -> usize {
    12000
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::base_default()
    }
}

impl LlmConfig {
    /// Defaults without environment overrides.
    pub fn base_default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            summary_prompt: None,
            max_content_chars: default_max_content_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_ENABLED`: "true" or "false"
    /// - `LLM_PROVIDER`: "openai" (default), "groq", "together" or "custom"
    /// - `LLM_ENDPOINT`: API base URL (defaults based on provider)
    /// - `LLM_API_KEY`: API key
    /// - `LLM_MODEL`: Model name
    /// - `LLM_MAX_TOKENS`: Maximum tokens in response
    /// - `LLM_TEMPERATURE`: Generation temperature (0.0-1.0)
    /// - `LLM_MAX_CONTENT_CHARS`: Max text chars to send
    /// - `LLM_SUMMARY_PROMPT`: Custom summary prompt
    ///
    /// `LLM_PROVIDER` wins over auto-detection from `GROQ_API_KEY` /
    /// `OPENAI_API_KEY`.
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_env_lookup<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("LLM_ENABLED") {
            self.enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        let explicit_endpoint = var("LLM_ENDPOINT");
        if let Some(ref endpoint) = explicit_endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(val) = var("LLM_API_KEY") {
            self.api_key = Some(val);
        }

        let explicit_provider = var("LLM_PROVIDER").and_then(|val| LlmProvider::from_str(&val));
        match explicit_provider {
            Some(provider) => {
                if explicit_endpoint.is_none() {
                    self.endpoint = provider.default_endpoint().to_string();
                }
                if self.api_key.is_none() {
                    self.api_key = provider.key_var().and_then(&var);
                }
                self.provider = provider;
            }
            None if self.api_key.is_none() => {
                // Auto-detect from whichever provider key is present
                for provider in [LlmProvider::Groq, LlmProvider::OpenAI] {
                    if let Some(key) = provider.key_var().and_then(&var) {
                        if explicit_endpoint.is_none() {
                            self.endpoint = provider.default_endpoint().to_string();
                        }
                        self.api_key = Some(key);
                        self.provider = provider;
                        break;
                    }
                }
            }
            None => {}
        }

        if let Some(val) = var("LLM_MODEL") {
            self.model = val;
        }
        if let Some(n) = var("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = n;
        }
        if let Some(t) = var("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        if let Some(n) = var("LLM_MAX_CONTENT_CHARS").and_then(|v| v.parse().ok()) {
            self.max_content_chars = n;
        }
        if let Some(val) = var("LLM_SUMMARY_PROMPT") {
            self.summary_prompt = Some(val);
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Get the summary prompt, using custom or default.
    pub fn get_summary_prompt(&self) -> &str {
        self.summary_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARY_PROMPT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LlmConfig::base_default();
        assert!(config.enabled);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.endpoint, "https://api.openai.com");
        assert!(config.get_summary_prompt().contains("less than 30 characters"));
    }

    #[test]
    fn test_groq_key_auto_detects_provider() {
        let config = LlmConfig::base_default().with_env_lookup(lookup(&[("GROQ_API_KEY", "gsk_1")]));
        assert_eq!(config.provider, LlmProvider::Groq);
        assert_eq!(config.endpoint, "https://api.groq.com/openai");
        assert_eq!(config.api_key.as_deref(), Some("gsk_1"));
    }

    #[test]
    fn test_explicit_provider_wins() {
        let config = LlmConfig::base_default().with_env_lookup(lookup(&[
            ("LLM_PROVIDER", "openai"),
            ("GROQ_API_KEY", "gsk_1"),
            ("OPENAI_API_KEY", "sk-2"),
            ("LLM_MODEL", "gpt-4o-mini"),
        ]));
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-2"));
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn test_explicit_endpoint_kept() {
        let config = LlmConfig::base_default().with_env_lookup(lookup(&[
            ("LLM_PROVIDER", "custom"),
            ("LLM_ENDPOINT", "http://gpu-box:8000"),
            ("LLM_MAX_TOKENS", "64"),
        ]));
        assert_eq!(config.endpoint, "http://gpu-box:8000");
        assert_eq!(config.max_tokens, 64);
        assert!(config.api_key.is_none());
    }
}
