//! Text summarization.

mod client;
mod summarizer;

pub use client::{LlmClient, LlmConfig, LlmError, LlmProvider};
pub use summarizer::{StubSummarizer, Summarizer};
