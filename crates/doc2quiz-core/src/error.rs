//! Error types for `doc2quiz-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("document filename must not be empty")]
  EmptyFilename,

  #[error("subject name must not be empty")]
  EmptySubjectName,

  #[error("an upload batch must contain at least one file")]
  EmptyBatch,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
