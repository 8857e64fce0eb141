//! Data models for pagesum.

mod page;
mod user;

pub use page::{Page, PageStatus};
pub use user::User;
