//! Summarization backends.
//!
//! [`Summarizer`] is the seam the enrichment pipeline depends on. The stub
//! is deterministic and needs no network; [`LlmClient`] calls a
//! chat-completions provider.

use async_trait::async_trait;

use super::client::{LlmClient, LlmError};

/// Produces a short summary of a text segment.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Summarize one segment. No retries are attempted.
    async fn summarize(&self, text: &str) -> Result<String, LlmError>;
}

/// Deterministic summarizer for tests and offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubSummarizer {
    /// The first `n` characters of the text.
    Prefix(usize),
    /// The same text for every input.
    Fixed(String),
}

impl StubSummarizer {
    pub const DEFAULT_PREFIX_CHARS: usize = 4;

    pub fn prefix(chars: usize) -> Self {
        Self::Prefix(chars)
    }

    pub fn fixed(text: impl Into<String>) -> Self {
        Self::Fixed(text.into())
    }
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self::Prefix(Self::DEFAULT_PREFIX_CHARS)
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        Ok(match self {
            Self::Prefix(n) => text.chars().take(*n).collect(),
            Self::Fixed(fixed) => fixed.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    fn name(&self) -> &str {
        &self.config().model
    }

    async fn summarize(&self, text: &str) -> Result<String, LlmError> {
        LlmClient::summarize(self, text).await
    }
}
