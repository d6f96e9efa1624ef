//! The subject ingestion pipeline.
//!
//! Turns a batch of uploaded files into persisted [`Document`]s and a
//! [`Subject`] that references them. Extraction fans out concurrently; the
//! subject only becomes visible once every document has been written, and a
//! failure anywhere rolls the batch back.
//!
//! [`Document`]: doc2quiz_core::document::Document
//! [`Subject`]: doc2quiz_core::subject::Subject

pub mod error;
pub mod extract;
pub mod ingestor;

pub use error::{Error, Result};
pub use extract::TextExtractor;
pub use ingestor::{IngestConfig, Ingestor, Upload};
