//! Document: one uploaded file's extracted text plus its provenance.
//!
//! Documents are built during ingestion and never updated afterwards. They
//! are removed only when their subject is deleted or when the ingestion that
//! produced them is rolled back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Open key-value bag attached to documents and subjects.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single extracted document belonging to a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub document_id: Uuid,
  /// The owning subject. The subject record may not exist yet while the
  /// batch is still being written.
  pub subject_id:  Uuid,
  pub filename:    String,
  pub ocr_text:    String,
  /// Shared by every document in the same upload batch.
  pub uploaded_at: DateTime<Utc>,
  #[serde(default)]
  pub metadata:    Metadata,
}

impl Document {
  /// Wrap extracted text into a new document with a fresh identity.
  ///
  /// The only rejected input is an empty filename; empty text is a valid
  /// (if degenerate) document.
  pub fn build(
    filename: impl Into<String>,
    ocr_text: impl Into<String>,
    subject_id: Uuid,
    uploaded_at: DateTime<Utc>,
  ) -> Result<Self> {
    let filename = filename.into();
    if filename.is_empty() {
      return Err(Error::EmptyFilename);
    }

    Ok(Self {
      document_id: Uuid::new_v4(),
      subject_id,
      filename,
      ocr_text: ocr_text.into(),
      uploaded_at,
      metadata: Metadata::new(),
    })
  }
}
