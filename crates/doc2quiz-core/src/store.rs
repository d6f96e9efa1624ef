//! The `DocumentStore` and `JobStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `doc2quiz-store-sqlite`). The ingestion pipeline and the HTTP layer depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  document::Document,
  job::{IngestJob, JobStatus},
  subject::Subject,
};

// ─── Documents and subjects ──────────────────────────────────────────────────

/// Abstraction over the document database holding subjects and documents.
///
/// No method retries on its own. Documents reference their subject by id
/// before the subject record exists, so backends must not enforce that
/// relation at insert time.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Bulk-insert documents. Callers must not rely on the batch being
  /// atomic.
  fn insert_documents<'a>(
    &'a self,
    documents: &'a [Document],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn insert_subject<'a>(
    &'a self,
    subject: &'a Subject,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Deletes (idempotent) ──────────────────────────────────────────────

  /// Delete every document owned by `subject_id` and return how many were
  /// removed. Zero matches is not an error.
  fn delete_documents_by_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Delete a subject record. Returns `false` if it did not exist.
  fn delete_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// List all subjects, newest first.
  fn list_subjects(
    &self,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  fn get_document(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// Documents owned by `subject_id`, in the order they were inserted.
  fn list_documents(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

/// Persistence for background ingestion jobs.
pub trait JobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_job<'a>(
    &'a self,
    job: &'a IngestJob,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Move a pending job to its final status and stamp `finished_at`.
  ///
  /// Returns the updated job. Finishing an unknown or already-finished job
  /// is an error.
  fn finish_job(
    &self,
    job_id: Uuid,
    status: JobStatus,
  ) -> impl Future<Output = Result<IngestJob, Self::Error>> + Send + '_;

  fn get_job(
    &self,
    job_id: Uuid,
  ) -> impl Future<Output = Result<Option<IngestJob>, Self::Error>> + Send + '_;
}
