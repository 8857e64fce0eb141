//! Web server for image uploads and page lookups.
//!
//! Exposes:
//! - `POST /api/v1/page` to upload an image for a user
//! - `GET /api/v1/page/:id` to read a page's text and summary
//! - `GET /api/v1/page/:id/all` to list a user's pages
//! - `GET /files/*path` to fetch stored images

mod handlers;
mod routes;

pub use routes::create_router;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::PageStore;
use crate::services::EnrichmentService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EnrichmentService>,
    pub store: Arc<dyn PageStore>,
    pub images_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = settings.create_db_context()?;
        ctx.init_schema().await?;

        let store: Arc<dyn PageStore> = Arc::new(ctx);
        let pipeline = settings.create_enrichment_service(store.clone())?;

        Ok(Self {
            pipeline: Arc::new(pipeline),
            store,
            images_dir: settings.images_dir.clone(),
            max_upload_bytes: settings.max_upload_bytes,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Starting server at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::llm::{LlmError, StubSummarizer, Summarizer};
    use crate::ocr::{OcrError, TextExtractor};
    use crate::repository::DieselDbContext;

    const BOUNDARY: &str = "pagesum-test-boundary";

    struct FakeExtractor(Vec<&'static str>);

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        fn name(&self) -> &str {
            "fake"
        }

        async fn extract_text(&self, _image: &[u8]) -> Result<Vec<String>, OcrError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        fn name(&self) -> &str {
            "failing"
        }

        async fn summarize(&self, _text: &str) -> Result<String, LlmError> {
            Err(LlmError::Provider("quota exceeded".to_string()))
        }
    }

    async fn setup_test_app_with(
        extractor: impl TextExtractor + 'static,
        summarizer: impl Summarizer + 'static,
    ) -> (axum::Router, Arc<dyn PageStore>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let images_dir = dir.path().join("images");
        std::fs::create_dir_all(&images_dir).unwrap();

        let ctx = DieselDbContext::new(&dir.path().join("test.db"), &images_dir);
        ctx.init_schema().await.unwrap();
        let store: Arc<dyn PageStore> = Arc::new(ctx);

        let pipeline =
            EnrichmentService::new(store.clone(), Arc::new(extractor), Arc::new(summarizer));
        let state = AppState {
            pipeline: Arc::new(pipeline),
            store: store.clone(),
            images_dir,
            max_upload_bytes: 1024,
        };

        (create_router(state), store, dir)
    }

    async fn setup_test_app() -> (axum::Router, Arc<dyn PageStore>, tempfile::TempDir) {
        setup_test_app_with(FakeExtractor(vec!["hello world"]), StubSummarizer::default()).await
    }

    fn multipart_body(fields: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            if name.starts_with("file") || *name == "image" {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.png\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
            }
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(fields: &[(&str, &[u8])]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/page")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(fields)))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _store, _dir) = setup_test_app().await;

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_then_get_page() {
        let (app, _store, _dir) = setup_test_app().await;

        let response = app
            .clone()
            .oneshot(upload_request(&[
                ("username", &b"alice"[..]),
                ("filetype", &b"IMG1"[..]),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["summaries"], serde_json::json!(["hell"]));
        assert!(json.get("error").is_none());
        let page_id = json["pageId"].as_str().unwrap().to_string();
        let user_id = json["userId"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/page/{}", page_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["textExtracted"], "hello world");
        assert_eq!(json["textSummary"], "hell");
        let image_url = json["imageURL"].as_str().unwrap().to_string();
        assert!(image_url.starts_with("/files/"));

        let response = app.clone().oneshot(get(&image_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"IMG1");

        let response = app
            .oneshot(get(&format!("/api/v1/page/{}/all", user_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["ids"], serde_json::json!([page_id]));
    }

    #[tokio::test]
    async fn test_upload_accepts_alternate_file_field() {
        let (app, _store, _dir) = setup_test_app().await;

        let response = app
            .oneshot(upload_request(&[("image", &b"IMG2"[..]), ("username", &b"bob"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_bad_request() {
        let (app, _store, _dir) = setup_test_app().await;

        let response = app
            .oneshot(upload_request(&[("username", &b"alice"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_upload_missing_username_is_bad_request() {
        let (app, store, _dir) = setup_test_app().await;

        let response = app
            .oneshot(upload_request(&[("filetype", &b"IMG1"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.find_user("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let (app, _store, _dir) = setup_test_app().await;

        let big = vec![b'x'; 4096];
        let response = app
            .oneshot(upload_request(&[("username", &b"alice"[..]), ("filetype", big.as_slice())]))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_partial_failure_reports_work_done() {
        let (app, store, _dir) =
            setup_test_app_with(FakeExtractor(vec!["hello world"]), FailingSummarizer).await;

        let response = app
            .oneshot(upload_request(&[
                ("username", &b"alice"[..]),
                ("filetype", &b"IMG1"[..]),
            ]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["summaries"], serde_json::json!([null]));
        assert!(json["error"].as_str().unwrap().contains("quota exceeded"));

        let page = store
            .get_page(json["pageId"].as_str().unwrap())
            .await
            .unwrap();
        assert_eq!(page.extracted_text.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn test_get_missing_page_is_not_found() {
        let (app, _store, _dir) = setup_test_app().await;

        let response = app.oneshot(get("/api/v1/page/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_pages_for_unknown_user_is_empty() {
        let (app, _store, _dir) = setup_test_app().await;

        let response = app.oneshot(get("/api/v1/page/nobody/all")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["ids"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_serve_file_rejects_traversal() {
        let (app, _store, dir) = setup_test_app().await;
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let response = app
            .oneshot(get("/files/../secret.txt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
