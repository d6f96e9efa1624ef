//! The `OcrService` trait for the external document-parsing collaborator.

use std::{future::Future, path::Path};

use serde::{Deserialize, Serialize};

/// Which representation the parsing service should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
  #[default]
  Markdown,
  Text,
}

impl ResultFormat {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Markdown => "markdown",
      Self::Text => "text",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OcrOptions {
  #[serde(default)]
  pub result_format: ResultFormat,
  /// Log progress of the remote parse at `info` rather than `debug`.
  #[serde(default)]
  pub verbose:       bool,
}

/// A remote service that turns an arbitrary file into text.
///
/// Calls are slow and cost money, so callers must not retry them silently.
/// The file at `path` only lives for the duration of the call.
pub trait OcrService: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn extract<'a>(
    &'a self,
    path: &'a Path,
    options: &'a OcrOptions,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
