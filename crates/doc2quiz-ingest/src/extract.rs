//! Text extraction: direct decoding for plain text, OCR for everything else.

use std::{ffi::OsStr, io::Write as _, path::Path, sync::Arc};

use bytes::Bytes;
use doc2quiz_core::ocr::{OcrOptions, OcrService};
use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Lower-cased extension of `filename`, without the dot.
fn extension(filename: &str) -> Option<String> {
  Path::new(filename)
    .extension()
    .and_then(OsStr::to_str)
    .map(str::to_ascii_lowercase)
}

/// Whether `filename` is decoded directly instead of being sent to OCR.
pub fn is_plain_text(filename: &str) -> bool {
  matches!(extension(filename).as_deref(), Some("txt" | "md"))
}

/// Decode as UTF-8, falling back to ISO-8859-1. Never fails.
pub fn decode_text(content: &[u8]) -> String {
  match std::str::from_utf8(content) {
    Ok(text) => text.to_owned(),
    Err(_) => content.iter().copied().map(char::from).collect(),
  }
}

/// Turns one uploaded file into text.
///
/// Non-text files are written to a temporary file that keeps the original
/// extension, handed to the OCR service, and removed when the call returns
/// or is cancelled.
pub struct TextExtractor<O> {
  ocr:     Arc<O>,
  options: OcrOptions,
}

impl<O: OcrService> TextExtractor<O> {
  pub fn new(ocr: Arc<O>, options: OcrOptions) -> Self { Self { ocr, options } }

  pub async fn extract(&self, filename: &str, content: &Bytes) -> Result<String> {
    if is_plain_text(filename) {
      return Ok(decode_text(content));
    }

    let staged = stage(filename, content.clone()).await?;
    tracing::debug!(filename, path = %staged.path().display(), "sending file to OCR");

    self
      .ocr
      .extract(staged.path(), &self.options)
      .await
      .map_err(|e| Error::Extraction { filename: filename.to_owned(), source: Box::new(e) })
  }
}

/// Write `content` to a fresh temporary file named after `filename`'s
/// extension.
async fn stage(filename: &str, content: Bytes) -> Result<NamedTempFile> {
  let suffix = extension(filename).map(|ext| format!(".{ext}")).unwrap_or_default();

  let written = tokio::task::spawn_blocking(move || {
    let mut file = tempfile::Builder::new()
      .prefix("doc2quiz-")
      .suffix(&suffix)
      .tempfile()?;
    file.write_all(&content)?;
    file.flush()?;
    Ok::<_, std::io::Error>(file)
  })
  .await?;

  written.map_err(|source| Error::Staging { filename: filename.to_owned(), source })
}
