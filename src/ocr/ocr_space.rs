//! OCR.space client.
//!
//! Posts the image as multipart form data to the `parse/image` endpoint and
//! returns the `ParsedText` of every parsed result, in provider order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::backend::{OcrError, TextExtractor};
use crate::storage;

/// Configuration for the OCR.space client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrSpaceConfig {
    /// Full URL of the `parse/image` endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Value of the `apikey` header.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Recognition language (OCR.space three-letter code).
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "https://api.ocr.space/parse/image".to_string()
}

fn default_api_key() -> String {
    // Public demo key, heavily rate limited.
    "helloworld".to_string()
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OcrSpaceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: default_api_key(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OcrSpaceConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `OCR_SPACE_ENDPOINT`: endpoint URL
    /// - `OCR_SPACE_API_KEY`: API key
    /// - `OCR_LANGUAGE`: recognition language
    /// - `OCR_TIMEOUT_SECS`: request timeout
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn with_env_lookup<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("OCR_SPACE_ENDPOINT") {
            self.endpoint = val;
        }
        if let Some(val) = var("OCR_SPACE_API_KEY") {
            self.api_key = val;
        }
        if let Some(val) = var("OCR_LANGUAGE") {
            self.language = val;
        }
        if let Some(n) = var("OCR_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = n;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

/// OCR.space response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrSpaceResponse {
    #[serde(rename = "OCRExitCode", default)]
    pub ocr_exit_code: i32,
    #[serde(default)]
    pub is_errored_on_processing: bool,
    /// A string or a list of strings, depending on the failure.
    #[serde(default)]
    pub error_message: serde_json::Value,
    #[serde(default)]
    pub error_details: serde_json::Value,
    /// Sent as a string by the provider.
    #[serde(default)]
    pub processing_time_in_milliseconds: serde_json::Value,
    #[serde(rename = "SearchablePDFURL", default)]
    pub searchable_pdf_url: Option<String>,
    #[serde(default)]
    pub parsed_results: Vec<ParsedResult>,
}

/// One parsed result (one page of the input).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedResult {
    #[serde(default)]
    pub file_parse_exit_code: i32,
    #[serde(default)]
    pub parsed_text: String,
    #[serde(default)]
    pub error_message: serde_json::Value,
    #[serde(default)]
    pub error_details: serde_json::Value,
}

impl OcrSpaceResponse {
    /// Flatten `ErrorMessage` and `ErrorDetails` into one line.
    pub fn error_text(&self) -> String {
        let mut parts = message_parts(&self.error_message);
        parts.extend(message_parts(&self.error_details));
        if parts.is_empty() {
            format!("processing failed (exit code {})", self.ocr_exit_code)
        } else {
            parts.join("; ")
        }
    }

    /// Parsed text of every result, in order. Results with no recognized
    /// text are skipped.
    pub fn segments(&self) -> Vec<String> {
        self.parsed_results
            .iter()
            .filter(|result| !result.parsed_text.trim().is_empty())
            .map(|result| result.parsed_text.clone())
            .collect()
    }
}

fn message_parts(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => vec![s.clone()],
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// OCR.space text extractor.
pub struct OcrSpaceClient {
    config: OcrSpaceConfig,
    client: Client,
}

impl OcrSpaceClient {
    /// Create a client; the underlying HTTP client is reused for every request.
    pub fn new(config: OcrSpaceConfig) -> Result<Self, OcrError> {
        if config.endpoint.is_empty() {
            return Err(OcrError::NotConfigured("empty OCR endpoint".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OcrSpaceConfig {
        &self.config
    }

    fn build_form(&self, image: &[u8]) -> Result<Form, OcrError> {
        // The provider sniffs the type from the file name.
        let extension = match storage::detect_extension(image) {
            "bin" => "png",
            ext => ext,
        };
        let mime = infer::get(image)
            .map(|kind| kind.mime_type())
            .unwrap_or("image/png");

        let part = Part::bytes(image.to_vec())
            .file_name(format!("image.{}", extension))
            .mime_str(mime)?;

        Ok(Form::new()
            .text("language", self.config.language.clone())
            .text("isOverlayRequired", "false")
            .text("iscreatesearchablepdf", "false")
            .text("issearchablepdfhidetextlayer", "false")
            .part("filetype", part))
    }
}

#[async_trait]
impl TextExtractor for OcrSpaceClient {
    fn name(&self) -> &str {
        "ocr.space"
    }

    async fn extract_text(&self, image: &[u8]) -> Result<Vec<String>, OcrError> {
        let form = self.build_form(image)?;

        debug!(
            "Sending {} bytes to OCR provider at {}",
            image.len(),
            self.config.endpoint
        );
        let resp = self
            .client
            .post(&self.config.endpoint)
            .header("apikey", &self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        let parsed: OcrSpaceResponse = serde_json::from_str(&body).map_err(|e| {
            let snippet: String = body.chars().take(200).collect();
            warn!("Unparseable OCR response (HTTP {}): {}", status, snippet);
            OcrError::Transport(format!("malformed OCR response (HTTP {}): {}", status, e))
        })?;

        if parsed.is_errored_on_processing {
            return Err(OcrError::Provider(parsed.error_text()));
        }
        if !status.is_success() {
            return Err(OcrError::Provider(format!("HTTP {}", status)));
        }

        for (i, result) in parsed.parsed_results.iter().enumerate() {
            let message = message_parts(&result.error_message);
            if !message.is_empty() {
                debug!(
                    "OCR result {} exit code {}: {}",
                    i,
                    result.file_parse_exit_code,
                    message.join("; ")
                );
            }
        }

        let segments = parsed.segments();
        info!(
            "OCR returned {} segment(s) in {} ms",
            segments.len(),
            parsed
                .processing_time_in_milliseconds
                .as_str()
                .unwrap_or("?")
        );
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OcrSpaceClient {
        let config = OcrSpaceConfig {
            api_key: "test-key".to_string(),
            ..OcrSpaceConfig::default()
        }
        .with_endpoint(&format!("{}/parse/image", server.uri()));
        OcrSpaceClient::new(config).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = OcrSpaceConfig::default();
        assert_eq!(config.endpoint, "https://api.ocr.space/parse/image");
        assert_eq!(config.language, "eng");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_error_text_accepts_string_or_list() {
        let single: OcrSpaceResponse = serde_json::from_value(json!({
            "OCRExitCode": 3,
            "IsErroredOnProcessing": true,
            "ErrorMessage": "Unable to recognize the file type"
        }))
        .unwrap();
        assert_eq!(single.error_text(), "Unable to recognize the file type");

        let list: OcrSpaceResponse = serde_json::from_value(json!({
            "OCRExitCode": 99,
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["E101: Timed out", "E500: Busy"],
            "ErrorDetails": ""
        }))
        .unwrap();
        assert_eq!(list.error_text(), "E101: Timed out; E500: Busy");

        let empty: OcrSpaceResponse =
            serde_json::from_value(json!({"OCRExitCode": 4, "IsErroredOnProcessing": true}))
                .unwrap();
        assert_eq!(empty.error_text(), "processing failed (exit code 4)");
    }

    #[tokio::test]
    async fn test_extract_text_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ParsedResults": [
                    {"FileParseExitCode": 1, "ParsedText": "hello world", "ErrorMessage": "", "ErrorDetails": ""},
                    {"FileParseExitCode": 1, "ParsedText": "second block", "ErrorMessage": "", "ErrorDetails": ""}
                ],
                "OCRExitCode": 1,
                "IsErroredOnProcessing": false,
                "ProcessingTimeInMilliseconds": "312",
                "SearchablePDFURL": "Searchable PDF not generated as it was not requested."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let segments = client_for(&server).extract_text(b"IMG1").await.unwrap();
        assert_eq!(segments, vec!["hello world", "second block"]);
    }

    #[tokio::test]
    async fn test_extract_text_sends_fixed_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/parse/image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ParsedResults": [],
                "OCRExitCode": 1,
                "IsErroredOnProcessing": false
            })))
            .mount(&server)
            .await;

        client_for(&server).extract_text(b"IMG1").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"language\""));
        assert!(body.contains("name=\"isOverlayRequired\""));
        assert!(body.contains("name=\"iscreatesearchablepdf\""));
        assert!(body.contains("name=\"issearchablepdfhidetextlayer\""));
        assert!(body.contains("name=\"filetype\"; filename=\"image.png\""));
        assert!(body.contains("IMG1"));
    }

    #[tokio::test]
    async fn test_extract_text_empty_results_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ParsedResults": [],
                "OCRExitCode": 1,
                "IsErroredOnProcessing": false
            })))
            .mount(&server)
            .await;

        let segments = client_for(&server).extract_text(b"IMG1").await.unwrap();
        assert!(segments.is_empty());
    }

    #[tokio::test]
    async fn test_extract_text_skips_blank_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ParsedResults": [
                    {"FileParseExitCode": 1, "ParsedText": "", "ErrorMessage": "", "ErrorDetails": ""},
                    {"FileParseExitCode": 1, "ParsedText": " \r\n", "ErrorMessage": "", "ErrorDetails": ""}
                ],
                "OCRExitCode": 1,
                "IsErroredOnProcessing": false
            })))
            .mount(&server)
            .await;

        let segments = client_for(&server).extract_text(b"IMG1").await.unwrap();
        assert!(segments.is_empty());
    }

    #[tokio::test]
    async fn test_extract_text_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "OCRExitCode": 3,
                "IsErroredOnProcessing": true,
                "ErrorMessage": ["File failed validation"],
                "ErrorDetails": "Invalid image"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).extract_text(b"IMG1").await.unwrap_err();
        match err {
            OcrError::Provider(msg) => {
                assert!(msg.contains("File failed validation"));
                assert!(msg.contains("Invalid image"));
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extract_text_malformed_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("The API key is invalid"))
            .mount(&server)
            .await;

        let err = client_for(&server).extract_text(b"IMG1").await.unwrap_err();
        assert!(matches!(err, OcrError::Transport(_)));
    }

    #[tokio::test]
    async fn test_extract_text_unreachable_is_transport_error() {
        let config = OcrSpaceConfig::default().with_endpoint("http://127.0.0.1:9/parse/image");
        let client = OcrSpaceClient::new(config).unwrap();

        let err = client.extract_text(b"IMG1").await.unwrap_err();
        assert!(matches!(err, OcrError::Transport(_)));
    }
}
