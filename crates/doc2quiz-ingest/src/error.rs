//! Error type for `doc2quiz-ingest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid upload: {0}")]
  Invalid(#[from] doc2quiz_core::Error),

  #[error("could not stage {filename} for parsing: {source}")]
  Staging {
    filename: String,
    #[source]
    source:   std::io::Error,
  },

  /// The OCR collaborator rejected or failed on a file.
  #[error("extraction failed for {filename}: {source}")]
  Extraction {
    filename: String,
    #[source]
    source:   Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("extraction task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("extraction pool is closed")]
  PoolClosed,
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
