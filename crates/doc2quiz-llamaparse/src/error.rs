//! Error type for `doc2quiz-llamaparse`.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("could not read {path}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("parsing service returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("parse job {job_id} failed: {message}")]
  JobFailed { job_id: String, message: String },

  #[error("parse job {0} was cancelled")]
  JobCancelled(String),

  #[error("parse job {job_id} did not finish within {waited:?}")]
  Timeout { job_id: String, waited: Duration },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
