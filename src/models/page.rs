//! Page models: one uploaded image plus the text and summary derived from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How far enrichment got for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Image stored, no text recorded yet.
    Pending,
    /// Extracted text recorded, no summary yet.
    TextExtracted,
    /// Both text and summary recorded.
    Summarized,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::TextExtracted => "text_extracted",
            Self::Summarized => "summarized",
        }
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single page record.
///
/// Every extracted segment of an upload gets its own page; all pages of one
/// upload share the same owner and image reference and differ by
/// `segment_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Storage-generated identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Image location relative to the images directory.
    pub image_path: String,
    /// Position of this page's segment in the extraction output (0-based).
    pub segment_index: u32,
    /// Text recognized by OCR, once stored.
    pub extracted_text: Option<String>,
    /// Short summary of `extracted_text`, once stored.
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// Create a new page for a stored image.
    pub fn new(user_id: String, image_path: String, segment_index: u32) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            image_path,
            segment_index,
            extracted_text: None,
            summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> PageStatus {
        match (&self.extracted_text, &self.summary) {
            (_, Some(_)) => PageStatus::Summarized,
            (Some(_), None) => PageStatus::TextExtracted,
            (None, None) => PageStatus::Pending,
        }
    }
}
