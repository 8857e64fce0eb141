//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite database.

pub mod diesel_context;
pub mod diesel_models;
pub mod diesel_page;
pub mod diesel_user;
pub mod pool;
pub mod store;
pub mod util;

pub use diesel_context::DieselDbContext;
pub use diesel_page::DieselPageRepository;
pub use diesel_user::DieselUserRepository;
pub use pool::{DbError, DbPool};
pub use store::{PageStore, StorageError};
