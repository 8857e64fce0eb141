//! Diesel-based page repository for SQLite.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewPage, PageRecord};
use super::pool::{DbError, DbPool};
use super::util::parse_datetime;
use crate::models::Page;
use crate::schema::pages;

/// Convert a database record to a domain model.
impl From<PageRecord> for Page {
    fn from(record: PageRecord) -> Self {
        Page {
            id: record.id,
            user_id: record.user_id,
            image_path: record.image_path,
            segment_index: record.segment_index.max(0) as u32,
            extracted_text: record.ocr_parsed_text,
            summary: record.summary,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

/// Diesel-based page repository.
#[derive(Clone)]
pub struct DieselPageRepository {
    pool: DbPool,
}

impl DieselPageRepository {
    /// Create a new page repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new page.
    pub async fn insert(&self, page: &Page) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        let created_at = page.created_at.to_rfc3339();
        let updated_at = page.updated_at.to_rfc3339();

        diesel::insert_into(pages::table)
            .values(&NewPage {
                id: &page.id,
                user_id: &page.user_id,
                image_path: &page.image_path,
                segment_index: page.segment_index as i32,
                ocr_parsed_text: page.extracted_text.as_deref(),
                summary: page.summary.as_deref(),
                created_at: &created_at,
                updated_at: &updated_at,
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Get a page by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Page>, DbError> {
        let mut conn = self.pool.get().await?;

        pages::table
            .find(id)
            .first::<PageRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Page::from))
    }

    /// Set the extracted text of a page. Returns false if no page matched.
    pub async fn update_text(&self, id: &str, text: &str) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        let rows = diesel::update(pages::table.find(id))
            .set((
                pages::ocr_parsed_text.eq(Some(text)),
                pages::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Set the summary of a page. Returns false if no page matched.
    pub async fn update_summary(&self, id: &str, summary: &str) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        let now = Utc::now().to_rfc3339();

        let rows = diesel::update(pages::table.find(id))
            .set((pages::summary.eq(Some(summary)), pages::updated_at.eq(&now)))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// List page IDs owned by a user, oldest upload first and segments in order.
    pub async fn list_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;

        pages::table
            .filter(pages::user_id.eq(user_id))
            .order((pages::created_at.asc(), pages::segment_index.asc()))
            .select(pages::id)
            .load::<String>(&mut conn)
            .await
    }
}
