//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let max_upload = state.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        // Upload and page lookup
        .route(
            "/api/v1/page",
            post(handlers::upload_page).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/api/v1/page/:id", get(handlers::get_page))
        .route("/api/v1/page/:id/all", get(handlers::list_user_pages))
        // Stored images
        .route("/files/*path", get(handlers::serve_file))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
