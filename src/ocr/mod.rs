//! OCR text extraction.
//!
//! Images are sent to a remote OCR provider; [`OcrSpaceClient`] speaks the
//! OCR.space `parse/image` API.

mod backend;
mod ocr_space;

pub use backend::{OcrError, TextExtractor};
pub use ocr_space::{OcrSpaceClient, OcrSpaceConfig, OcrSpaceResponse, ParsedResult};
