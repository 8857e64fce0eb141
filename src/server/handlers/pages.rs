//! Page upload and lookup handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::super::AppState;
use crate::repository::StorageError;
use crate::services::{EnrichError, Enrichment};

/// Multipart field names accepted for the image.
const FILE_FIELDS: [&str; 3] = ["filetype", "file", "image"];

/// Response body for `POST /api/v1/page`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_ids: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summaries: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    fn failed(error: String) -> Self {
        Self {
            success: false,
            user_id: None,
            page_id: None,
            page_ids: None,
            summaries: None,
            error: Some(error),
        }
    }

    fn from_enrichment(enrichment: Enrichment) -> Self {
        let error = if enrichment.is_complete() {
            None
        } else {
            Some(enrichment.failures.to_string())
        };
        Self {
            success: error.is_none(),
            user_id: Some(enrichment.user_id),
            page_id: Some(enrichment.page_id),
            page_ids: Some(enrichment.page_ids),
            summaries: Some(enrichment.summaries),
            error,
        }
    }
}

/// Response body for `GET /api/v1/page/:id`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    #[serde(rename = "imageURL")]
    pub image_url: String,
    pub text_extracted: Option<String>,
    pub text_summary: Option<String>,
}

/// Response body for `GET /api/v1/page/:id/all`.
#[derive(Debug, Serialize)]
pub struct PageIdsResponse {
    pub ids: Vec<String>,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(UploadResponse::failed(message.to_string())),
    )
        .into_response()
}

fn error_json(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Accept an image upload and run it through the enrichment pipeline.
pub async fn upload_page(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut image: Option<Vec<u8>> = None;
    let mut username: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Rejecting malformed upload: {}", e);
                return bad_request(&format!("Malformed multipart body: {}", e));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if FILE_FIELDS.contains(&name.as_str()) {
            match field.bytes().await {
                Ok(bytes) => image = Some(bytes.to_vec()),
                Err(e) => return bad_request(&format!("Failed to read file field: {}", e)),
            }
        } else if name == "username" {
            match field.text().await {
                Ok(text) => username = Some(text.trim().to_string()),
                Err(e) => return bad_request(&format!("Failed to read username: {}", e)),
            }
        }
    }

    let image = match image {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return bad_request("Missing file field"),
    };
    let username = match username {
        Some(name) if !name.is_empty() => name,
        _ => return bad_request("Missing username field"),
    };

    let outcome = state
        .pipeline
        .enrich(&username, &image)
        .await
        .and_then(|enrichment| enrichment.into_result());

    match outcome {
        Ok(enrichment) => Json(UploadResponse::from_enrichment(enrichment)).into_response(),
        // Partial work is reported but still counts as a failure
        Err(EnrichError::Partial(enrichment)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UploadResponse::from_enrichment(*enrichment)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Upload for '{}' failed: {}", username, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadResponse::failed(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Return a page's image URL, extracted text and summary.
pub async fn get_page(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_page(&id).await {
        Ok(page) => Json(PageResponse {
            image_url: format!("/files/{}", page.image_path),
            text_extracted: page.extracted_text,
            text_summary: page.summary,
        })
        .into_response(),
        Err(StorageError::NotFound(_)) => {
            error_json(StatusCode::NOT_FOUND, format!("Page {} not found", id))
        }
        Err(e) => {
            tracing::error!("Failed to load page {}: {}", id, e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// List the page IDs of a user.
pub async fn list_user_pages(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.list_page_ids(&id).await {
        Ok(ids) => Json(PageIdsResponse { ids }).into_response(),
        Err(e) => {
            tracing::error!("Failed to list pages for user {}: {}", id, e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
