//! pagesum - image upload service that extracts text and stores short summaries.
//!
//! An uploaded image is stored for its user, sent to an OCR provider, and
//! every recognized text segment is summarized and saved alongside it.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod storage;
