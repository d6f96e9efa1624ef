//! Handler for `GET /jobs/:id`.

use axum::{
  Json,
  extract::{Path, State},
};
use doc2quiz_core::{
  job::IngestJob,
  ocr::OcrService,
  store::{DocumentStore, JobStore},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /jobs/:id`. `status` is one of `pending`, `succeeded` (with
/// `subject_id`) or `failed` (with `reason`).
pub async fn get_one<S, O>(
  State(state): State<AppState<S, O>>,
  Path(id): Path<Uuid>,
) -> Result<Json<IngestJob>, ApiError>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  let job = state
    .store
    .get_job(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("job {id} not found")))?;
  Ok(Json(job))
}
