//! LlamaParse backend for the doc2quiz OCR collaborator.
//!
//! Implements [`doc2quiz_core::ocr::OcrService`] over the LlamaParse REST API:
//! upload the file, poll the parse job until it settles, then fetch the
//! result in the requested format.

mod client;

pub mod error;

pub use client::{LlamaParse, LlamaParseConfig};
pub use error::{Error, Result};
