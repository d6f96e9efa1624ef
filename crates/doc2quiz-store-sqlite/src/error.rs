//! Error type for `doc2quiz-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row could not be mapped back onto a domain type.
  #[error("corrupt row: {0}")]
  CorruptRow(String),

  #[error("job not found: {0}")]
  JobNotFound(uuid::Uuid),

  #[error("job {0} is already finished")]
  JobAlreadyFinished(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
