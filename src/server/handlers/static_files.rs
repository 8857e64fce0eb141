//! Static file serving handlers.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use super::super::AppState;
use crate::storage;

/// Serve a stored image.
pub async fn serve_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let canonical_images_dir = match state.images_dir.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let file_path = match storage::resolve_image_path(&canonical_images_dir, &path) {
        Some(p) => p,
        None => return (StatusCode::NOT_FOUND, "File not found").into_response(),
    };

    let canonical_file = match file_path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    // Symlinks must not lead outside the images directory
    if !canonical_file.starts_with(&canonical_images_dir) {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    let content = match tokio::fs::read(&canonical_file).await {
        Ok(c) => c,
        Err(_) => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
        }
    };

    let mime = mime_guess::from_path(&canonical_file)
        .first_or_octet_stream()
        .to_string();

    ([(header::CONTENT_TYPE, mime)], content).into_response()
}
