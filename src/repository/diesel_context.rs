//! Diesel database context for managing the connection pool and repository access.
//!
//! Provides a unified entry point for database operations and owns the
//! directory where uploaded images are written.

use std::path::{Path, PathBuf};

use diesel_async::SimpleAsyncConnection;

use super::diesel_page::DieselPageRepository;
use super::diesel_user::DieselUserRepository;
use super::pool::{DbError, DbPool};

/// Diesel database context that manages the connection pool and provides repository access.
///
/// Create one context at startup and share it; repositories handed out by it
/// are cheap clones over the same pool.
///
/// # Example
/// ```ignore
/// let ctx = DieselDbContext::new(&db_path, &images_dir);
/// ctx.init_schema().await?;
/// let (user, _) = ctx.users().get_or_create("alice").await?;
/// ```
#[derive(Clone)]
pub struct DieselDbContext {
    pool: DbPool,
    images_dir: PathBuf,
}

impl DieselDbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path, images_dir: &Path) -> Self {
        Self {
            pool: DbPool::from_path(db_path),
            images_dir: images_dir.to_path_buf(),
        }
    }

    /// Create a new database context from a database URL.
    ///
    /// Accepts `sqlite:path/to/db.sqlite` URLs or plain file paths.
    pub fn from_url(database_url: &str, images_dir: &Path) -> Result<Self, DbError> {
        Ok(Self {
            pool: DbPool::from_url(database_url)?,
            images_dir: images_dir.to_path_buf(),
        })
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Directory where image files are stored.
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Get a user repository.
    pub fn users(&self) -> DieselUserRepository {
        DieselUserRepository::new(self.pool.clone())
    }

    /// Get a page repository.
    pub fn pages(&self) -> DieselPageRepository {
        DieselPageRepository::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// Creates the tables if they don't exist; safe to run on every start.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            PRAGMA journal_mode = WAL;

            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE CHECK (length(username) > 0),
                created_at TEXT NOT NULL
            );

            -- Pages table (one row per extracted segment of an uploaded image)
            CREATE TABLE IF NOT EXISTS pages (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                image_path TEXT NOT NULL,
                segment_index INTEGER NOT NULL DEFAULT 0,
                ocr_parsed_text TEXT,
                summary TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_pages_user ON pages(user_id, created_at);
            "#,
        )
        .await
    }

    /// Get list of all tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel_async::RunQueryDsl::load(
            diesel::sql_query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            ),
            &mut conn,
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}
