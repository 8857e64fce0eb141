//! SQLite connection pool.
//!
//! SQLite connections are cheap to open, so the "pool" is a connection
//! factory: every repository call establishes its own connection through
//! diesel-async's `SyncConnectionWrapper`, which runs the blocking driver on
//! tokio's blocking pool.

use std::path::Path;

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

use super::util::{is_postgres_url, to_diesel_error};

/// Diesel error type alias.
pub type DbError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// Applied to every new connection. Foreign keys are off by default in
/// SQLite, and concurrent uploads must wait on the write lock instead of
/// failing with SQLITE_BUSY.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 30000;";

/// SQLite connection pool (lightweight - creates connections on demand).
#[derive(Clone, Debug)]
pub struct DbPool {
    database_url: String,
}

impl DbPool {
    /// Create a new pool for a database URL or plain file path.
    pub fn new(database_url: &str) -> Self {
        // Strip sqlite: / sqlite:// prefix if present
        let url = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        Self {
            database_url: url.to_string(),
        }
    }

    /// Create a pool from a database URL, rejecting backends we cannot serve.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        if is_postgres_url(url) {
            return Err(to_diesel_error(format!(
                "unsupported database URL '{}': only SQLite is supported",
                url
            )));
        }
        Ok(Self::new(url))
    }

    /// Create pool from a file path.
    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.display().to_string())
    }

    /// Get a connection.
    pub async fn get(&self) -> Result<SqliteConn, DbError> {
        let mut conn = SqliteConn::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)?;
        conn.batch_execute(CONNECTION_PRAGMAS).await?;
        Ok(conn)
    }

    /// Get the database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}
