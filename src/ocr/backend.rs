//! Text extraction abstraction.
//!
//! The enrichment pipeline talks to OCR providers only through
//! [`TextExtractor`], so a remote provider and an in-process fake are
//! interchangeable.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a text extraction provider.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Network failure, timeout, or a response body that could not be parsed.
    #[error("OCR transport error: {0}")]
    Transport(String),

    /// The provider processed the request and reported a failure.
    #[error("OCR provider error: {0}")]
    Provider(String),

    #[error("OCR backend not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for OcrError {
    fn from(e: reqwest::Error) -> Self {
        OcrError::Transport(e.to_string())
    }
}

/// Extracts text segments from raw image bytes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Extract the ordered text segments found in `image`.
    ///
    /// An empty vector means the provider found no text; it is not an error.
    async fn extract_text(&self, image: &[u8]) -> Result<Vec<String>, OcrError>;
}
