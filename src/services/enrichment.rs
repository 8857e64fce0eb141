//! Upload enrichment service.
//!
//! Runs one upload through user resolution, image storage, text extraction
//! and per-segment summarization. User and image persistence are fatal;
//! anything that goes wrong for an individual segment is recorded and the
//! remaining segments are still processed.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::llm::Summarizer;
use crate::ocr::{OcrError, TextExtractor};
use crate::repository::{PageStore, StorageError};

/// Step of segment processing that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStage {
    /// Creating the sibling page for a segment after the first.
    CreatePage,
    SaveText,
    Summarize,
    SaveSummary,
}

impl SegmentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatePage => "create page",
            Self::SaveText => "save text",
            Self::Summarize => "summarize",
            Self::SaveSummary => "save summary",
        }
    }
}

/// A recorded, non-fatal failure for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFailure {
    /// Position in the extraction output.
    pub segment: usize,
    /// Page the segment belongs to, when it exists.
    pub page_id: Option<String>,
    pub stage: SegmentStage,
    pub message: String,
}

impl fmt::Display for SegmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "segment {}: {} failed: {}",
            self.segment,
            self.stage.as_str(),
            self.message
        )
    }
}

/// All failures recorded during one enrichment, joined into a single error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentFailures(pub Vec<SegmentFailure>);

impl SegmentFailures {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of distinct segments with at least one failure.
    pub fn failed_segments(&self) -> usize {
        self.0
            .iter()
            .map(|f| f.segment)
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn push(&mut self, failure: SegmentFailure) {
        self.0.push(failure);
    }
}

impl fmt::Display for SegmentFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for SegmentFailures {}

/// Outcome of one upload that got past image storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub user_id: String,
    /// Page created for the image; holds segment 0.
    pub page_id: String,
    /// Page per segment, `None` where the sibling page could not be created.
    pub page_ids: Vec<Option<String>>,
    /// Summary per segment, `None` where summarization failed.
    pub summaries: Vec<Option<String>>,
    pub failures: SegmentFailures,
}

impl Enrichment {
    /// True when every segment was stored and summarized.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Treat any recorded failure as an error.
    pub fn into_result(self) -> Result<Self, EnrichError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(EnrichError::Partial(Box::new(self)))
        }
    }
}

/// Errors from the enrichment pipeline.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("failed to resolve user '{username}': {source}")]
    ResolveUser {
        username: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to store image: {0}")]
    SaveImage(#[source] StorageError),

    /// The image is stored; no text was recorded.
    #[error("text extraction failed for page {page_id}: {source}")]
    Extract {
        page_id: String,
        #[source]
        source: OcrError,
    },

    #[error("{} of {} segment(s) failed: {}", .0.failures.failed_segments(), .0.summaries.len(), .0.failures)]
    Partial(Box<Enrichment>),
}

/// Service that enriches uploaded images.
pub struct EnrichmentService {
    store: Arc<dyn PageStore>,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
}

impl EnrichmentService {
    /// Create a new enrichment service.
    pub fn new(
        store: Arc<dyn PageStore>,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            store,
            extractor,
            summarizer,
        }
    }

    pub fn store(&self) -> &Arc<dyn PageStore> {
        &self.store
    }

    /// Enrich one upload.
    ///
    /// Returns `Err` only for fatal failures. Segment failures are collected
    /// in [`Enrichment::failures`]; use [`Enrichment::into_result`] to treat
    /// them as an error.
    pub async fn enrich(&self, username: &str, image: &[u8]) -> Result<Enrichment, EnrichError> {
        let user_id = self
            .store
            .resolve_or_create_user(username)
            .await
            .map_err(|source| EnrichError::ResolveUser {
                username: username.to_string(),
                source,
            })?;

        let page_id = self
            .store
            .save_image(&user_id, image)
            .await
            .map_err(EnrichError::SaveImage)?;
        info!(
            "Stored {} byte image for '{}' as page {}",
            image.len(),
            username,
            page_id
        );

        let segments = self
            .extractor
            .extract_text(image)
            .await
            .map_err(|source| {
                warn!("{} extraction failed for page {}: {}", self.extractor.name(), page_id, source);
                EnrichError::Extract {
                    page_id: page_id.clone(),
                    source,
                }
            })?;
        debug!("Extracted {} segment(s) for page {}", segments.len(), page_id);

        let mut result = Enrichment {
            user_id,
            page_id,
            page_ids: Vec::with_capacity(segments.len()),
            summaries: Vec::with_capacity(segments.len()),
            failures: SegmentFailures::default(),
        };

        for (index, text) in segments.iter().enumerate() {
            self.process_segment(&mut result, index, text).await;
        }

        if result.is_complete() {
            info!(
                "Page {} enriched with {} summary(ies)",
                result.page_id,
                result.summaries.len()
            );
        } else {
            warn!(
                "Page {} enriched with {} failure(s): {}",
                result.page_id,
                result.failures.len(),
                result.failures
            );
        }

        Ok(result)
    }

    async fn process_segment(&self, result: &mut Enrichment, index: usize, text: &str) {
        let page_id = if index == 0 {
            Some(result.page_id.clone())
        } else {
            match self
                .store
                .add_segment_page(&result.page_id, index as u32)
                .await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    record(result, index, None, SegmentStage::CreatePage, e.to_string());
                    None
                }
            }
        };
        result.page_ids.push(page_id.clone());

        if let Some(ref id) = page_id {
            if let Err(e) = self.store.save_extracted_text(id, text).await {
                record(result, index, page_id.clone(), SegmentStage::SaveText, e.to_string());
            }
        }

        let summary = match self.summarizer.summarize(text).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                record(result, index, page_id.clone(), SegmentStage::Summarize, e.to_string());
                None
            }
        };

        if let (Some(id), Some(summary)) = (page_id.as_deref(), summary.as_deref()) {
            if let Err(e) = self.store.save_summary(id, summary).await {
                record(
                    result,
                    index,
                    page_id.clone(),
                    SegmentStage::SaveSummary,
                    e.to_string(),
                );
            }
        }

        result.summaries.push(summary);
    }
}

fn record(
    result: &mut Enrichment,
    segment: usize,
    page_id: Option<String>,
    stage: SegmentStage,
    message: String,
) {
    warn!(
        "Segment {} of page {}: {} failed: {}",
        segment,
        page_id.as_deref().unwrap_or("-"),
        stage.as_str(),
        message
    );
    result.failures.push(SegmentFailure {
        segment,
        page_id,
        stage,
        message,
    });
}
