//! Diesel-based user repository for SQLite.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use super::diesel_models::{NewUser, UserRecord};
use super::pool::{DbError, DbPool};
use super::util::parse_datetime;
use crate::models::User;
use crate::schema::users;

/// Convert a database record to a domain model.
impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            username: record.username,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based user repository.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new user repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.pool.get().await?;

        users::table
            .find(id)
            .first::<UserRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(User::from))
    }

    /// Look up a user by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.pool.get().await?;

        users::table
            .filter(users::username.eq(username))
            .first::<UserRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(User::from))
    }

    /// Return the user for `username`, creating it on first sight.
    ///
    /// The insert is `INSERT OR IGNORE` against the unique username index, so
    /// two callers racing on a new username both end up reading the single
    /// row that won. The boolean is true when this call created the row.
    pub async fn get_or_create(&self, username: &str) -> Result<(User, bool), DbError> {
        let mut conn = self.pool.get().await?;

        let existing = users::table
            .filter(users::username.eq(username))
            .first::<UserRecord>(&mut conn)
            .await
            .optional()?;
        if let Some(record) = existing {
            return Ok((User::from(record), false));
        }

        let candidate = User::new(username.to_string());
        let created_at = candidate.created_at.to_rfc3339();
        let inserted = diesel::insert_or_ignore_into(users::table)
            .values(&NewUser {
                id: &candidate.id,
                username: &candidate.username,
                created_at: &created_at,
            })
            .execute(&mut conn)
            .await?;

        let record = users::table
            .filter(users::username.eq(username))
            .first::<UserRecord>(&mut conn)
            .await?;

        if inserted > 0 {
            debug!("Created user {} ({})", record.username, record.id);
        }
        Ok((User::from(record), inserted > 0))
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;

        users::table.count().get_result(&mut conn).await
    }
}
