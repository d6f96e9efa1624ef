//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Newest first |
//! | `GET`    | `/subjects/:id` | 404 if not found |
//! | `GET`    | `/subjects/:id/documents` | 404 if the subject is not found |
//! | `DELETE` | `/subjects/:id` | Removes the subject and its documents; 204 or 404 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use doc2quiz_core::{
  document::Document,
  ocr::OcrService,
  store::{DocumentStore, JobStore},
  subject::Subject,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S, O>(State(state): State<AppState<S, O>>) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  let subjects = state
    .store
    .list_subjects()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(subjects))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/:id`
pub async fn get_one<S, O>(
  State(state): State<AppState<S, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  let subject = state
    .store
    .get_subject(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(subject))
}

// ─── Documents ────────────────────────────────────────────────────────────────

/// `GET /subjects/:id/documents`
pub async fn documents<S, O>(
  State(state): State<AppState<S, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  // Documents land before their subject does; only report them once the
  // subject itself is visible.
  state
    .store
    .get_subject(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  let documents = state
    .store
    .list_documents(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(documents))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id`
pub async fn delete_one<S, O>(
  State(state): State<AppState<S, O>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  if state.ingestor.remove_subject(id).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("subject {id} not found")))
  }
}
