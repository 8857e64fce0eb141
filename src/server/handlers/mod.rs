//! HTTP request handlers for the web server.

mod api;
mod pages;
mod static_files;

// Re-export handlers for use by the router
pub use api::health;
pub use pages::{get_page, list_user_pages, upload_page};
pub use static_files::serve_file;
