//! Storage gateway used by the enrichment pipeline.
//!
//! The pipeline only sees [`PageStore`] and [`StorageError`]; the SQLite
//! implementation lives on [`DieselDbContext`].

use async_trait::async_trait;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::{debug, info};

use super::diesel_context::DieselDbContext;
use crate::models::Page;
use crate::storage;

/// Errors surfaced by the storage gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage I/O failure: {0}")]
    Io(String),
}

impl From<DieselError> for StorageError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => StorageError::NotFound("record not found".to_string()),
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => {
                    StorageError::ConstraintViolation(info.message().to_string())
                }
                _ => StorageError::Io(info.message().to_string()),
            },
            other => StorageError::Io(other.to_string()),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(e.to_string()),
            _ => StorageError::Io(e.to_string()),
        }
    }
}

/// Persistence of users, images, extracted text and summaries.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Look up `username`, creating the user on first sight. Idempotent.
    /// Surrounding whitespace is not part of a username.
    async fn resolve_or_create_user(&self, username: &str) -> Result<String, StorageError>;

    /// Look up `username` without creating it.
    async fn find_user(&self, username: &str) -> Result<Option<String>, StorageError>;

    /// Store image bytes for a user and create the page that owns them.
    async fn save_image(&self, user_id: &str, image: &[u8]) -> Result<String, StorageError>;

    /// Create a sibling page sharing the owner and image of `page_id`, for
    /// the segment at `segment_index`.
    async fn add_segment_page(
        &self,
        page_id: &str,
        segment_index: u32,
    ) -> Result<String, StorageError>;

    /// Record the extracted text of a page.
    async fn save_extracted_text(&self, page_id: &str, text: &str) -> Result<(), StorageError>;

    /// Record the summary of a page.
    async fn save_summary(&self, page_id: &str, summary: &str) -> Result<(), StorageError>;

    /// Fetch a page. Fails with `NotFound` when no page matches.
    async fn get_page(&self, page_id: &str) -> Result<Page, StorageError>;

    /// List the page IDs owned by a user; empty when there are none.
    async fn list_page_ids(&self, user_id: &str) -> Result<Vec<String>, StorageError>;

    /// Read stored image bytes back by image reference.
    async fn read_image(&self, image_ref: &str) -> Result<Vec<u8>, StorageError>;
}

#[async_trait]
impl PageStore for DieselDbContext {
    async fn resolve_or_create_user(&self, username: &str) -> Result<String, StorageError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StorageError::ConstraintViolation(
                "username must not be empty".to_string(),
            ));
        }
        let (user, created) = self.users().get_or_create(username).await?;
        if created {
            info!("New user '{}' ({})", user.username, user.id);
        }
        Ok(user.id)
    }

    async fn find_user(&self, username: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .users()
            .find_by_username(username.trim())
            .await?
            .map(|user| user.id))
    }

    async fn save_image(&self, user_id: &str, image: &[u8]) -> Result<String, StorageError> {
        let image_path = storage::save_image_file(self.images_dir(), image).await?;
        let page = Page::new(user_id.to_string(), image_path, 0);
        self.pages().insert(&page).await?;
        debug!(
            "Stored image {} ({} bytes) as page {}",
            page.image_path,
            image.len(),
            page.id
        );
        Ok(page.id)
    }

    async fn add_segment_page(
        &self,
        page_id: &str,
        segment_index: u32,
    ) -> Result<String, StorageError> {
        let repo = self.pages();
        let primary = repo
            .get(page_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("page {}", page_id)))?;

        let mut sibling = Page::new(primary.user_id, primary.image_path, segment_index);
        // Siblings sort with the upload they belong to.
        sibling.created_at = primary.created_at;
        repo.insert(&sibling).await?;
        Ok(sibling.id)
    }

    async fn save_extracted_text(&self, page_id: &str, text: &str) -> Result<(), StorageError> {
        if self.pages().update_text(page_id, text).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("page {}", page_id)))
        }
    }

    async fn save_summary(&self, page_id: &str, summary: &str) -> Result<(), StorageError> {
        if self.pages().update_summary(page_id, summary).await? {
            Ok(())
        } else {
            Err(StorageError::NotFound(format!("page {}", page_id)))
        }
    }

    async fn get_page(&self, page_id: &str) -> Result<Page, StorageError> {
        self.pages()
            .get(page_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("page {}", page_id)))
    }

    async fn list_page_ids(&self, user_id: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.pages().list_ids_for_user(user_id).await?)
    }

    async fn read_image(&self, image_ref: &str) -> Result<Vec<u8>, StorageError> {
        Ok(storage::read_image_file(self.images_dir(), image_ref).await?)
    }
}
