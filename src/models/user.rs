//! User model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploader, identified by a unique username.
///
/// Users are created the first time a username is seen and are never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Storage-generated identifier.
    pub id: String,
    /// Unique, non-empty username.
    pub username: String,
    /// When the user was first seen.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a freshly generated identifier.
    pub fn new(username: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            created_at: Utc::now(),
        }
    }
}
