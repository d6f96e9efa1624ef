//! Handler for `POST /upload`.
//!
//! Multipart form fields:
//!
//! | Field   | Kind | Notes |
//! |---------|------|-------|
//! | `files` | file | Repeatable; every part needs a filename |
//! | `name`  | text | Subject name; must not be blank |
//!
//! The files are read fully into memory, a background ingestion job is
//! submitted, and the response is sent before any extraction happens. Poll
//! `GET /jobs/{job_id}` for the outcome.

use axum::{
  Json,
  extract::{Multipart, State},
};
use doc2quiz_core::{ocr::OcrService, store::{DocumentStore, JobStore}};
use doc2quiz_ingest::Upload;
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
  pub message: &'static str,
  pub job_id:  Uuid,
}

/// `POST /upload`
pub async fn handler<S, O>(
  State(state): State<AppState<S, O>>,
  mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  let mut files = Vec::new();
  let mut name = None;

  while let Some(field) = multipart.next_field().await? {
    let part = field.name().unwrap_or_default().to_owned();
    match part.as_str() {
      "files" => {
        let filename = field
          .file_name()
          .filter(|n| !n.is_empty())
          .map(str::to_owned)
          .ok_or_else(|| ApiError::Unprocessable("every `files` part needs a filename".into()))?;
        let content = field.bytes().await?;
        files.push(Upload::new(filename, content));
      }
      "name" => name = Some(field.text().await?),
      other => tracing::debug!(field = other, "ignoring unknown multipart field"),
    }
  }

  if files.is_empty() {
    return Err(ApiError::Unprocessable("missing field `files`".into()));
  }
  let name = name.ok_or_else(|| ApiError::Unprocessable("missing field `name`".into()))?;

  let job = state.ingestor.submit(files, name).await?;
  tracing::info!(job_id = %job.job_id, files = job.file_count, "accepted upload");

  Ok(Json(UploadResponse {
    message: "Documents uploaded successfully",
    job_id:  job.job_id,
  }))
}
