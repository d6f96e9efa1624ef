//! [`Ingestor`] fans extraction out over a batch and commits the subject.
//!
//! Write order is documents first, then the subject that references them.
//! There is no transaction spanning the two; consistency on failure comes
//! from deleting everything written under the batch's subject id.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use doc2quiz_core::{
  document::Document,
  job::{IngestJob, JobStatus},
  ocr::{OcrOptions, OcrService},
  store::{DocumentStore, JobStore},
  subject::Subject,
};
use tokio::{sync::Semaphore, task::JoinSet};
use uuid::Uuid;

use crate::{Error, Result, TextExtractor};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// One uploaded file, fully read into memory.
#[derive(Debug, Clone)]
pub struct Upload {
  pub filename: String,
  pub content:  Bytes,
}

impl Upload {
  pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
    Self { filename: filename.into(), content: content.into() }
  }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
  /// Extractions allowed in flight at once, across all batches.
  pub max_concurrent_extractions: usize,
  pub ocr:                        OcrOptions,
}

impl Default for IngestConfig {
  fn default() -> Self {
    Self { max_concurrent_extractions: 4, ocr: OcrOptions::default() }
  }
}

// ─── Ingestor ────────────────────────────────────────────────────────────────

/// The subject ingestion orchestrator.
///
/// Cloning is cheap; clones share the store, the OCR client, and the
/// extraction permit pool.
pub struct Ingestor<S, O> {
  store:     Arc<S>,
  extractor: Arc<TextExtractor<O>>,
  permits:   Arc<Semaphore>,
}

impl<S, O> Clone for Ingestor<S, O> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      extractor: Arc::clone(&self.extractor),
      permits:   Arc::clone(&self.permits),
    }
  }
}

impl<S, O> Ingestor<S, O>
where
  S: DocumentStore + 'static,
  O: OcrService + 'static,
{
  pub fn new(store: Arc<S>, ocr: Arc<O>, config: IngestConfig) -> Self {
    Self {
      store,
      extractor: Arc::new(TextExtractor::new(ocr, config.ocr)),
      permits: Arc::new(Semaphore::new(config.max_concurrent_extractions.max(1))),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Ingest `batch` as a new subject called `name` and return its id.
  ///
  /// On any failure the documents and subject written under the new id are
  /// deleted before the original error is returned.
  pub async fn ingest(&self, batch: Vec<Upload>, name: &str) -> Result<Uuid> {
    validate(&batch, name)?;

    let subject_id = Uuid::new_v4();
    let submitted_at = Utc::now();
    tracing::info!(%subject_id, name, files = batch.len(), "ingesting subject");

    match self.commit(subject_id, submitted_at, batch, name).await {
      Ok(()) => Ok(subject_id),
      Err(err) => {
        tracing::warn!(%subject_id, error = %err, "ingestion failed, rolling back");
        self.rollback(subject_id).await;
        Err(err)
      }
    }
  }

  /// Delete a subject and all of its documents. Returns `false` if no
  /// subject record existed.
  pub async fn remove_subject(&self, subject_id: Uuid) -> Result<bool> {
    let existed = self.store.delete_subject(subject_id).await.map_err(Error::store)?;
    let count = self
      .store
      .delete_documents_by_subject(subject_id)
      .await
      .map_err(Error::store)?;

    tracing::info!(%subject_id, existed, documents = count, "removed subject");
    Ok(existed)
  }

  async fn commit(
    &self,
    subject_id: Uuid,
    submitted_at: DateTime<Utc>,
    batch: Vec<Upload>,
    name: &str,
  ) -> Result<()> {
    let documents = self.extract_all(subject_id, submitted_at, batch).await?;

    self.store.insert_documents(&documents).await.map_err(Error::store)?;
    tracing::debug!(%subject_id, count = documents.len(), "inserted documents");

    let subject = Subject::new(subject_id, name, submitted_at, &documents);
    self.store.insert_subject(&subject).await.map_err(Error::store)?;
    tracing::info!(%subject_id, documents = documents.len(), "inserted subject");

    Ok(())
  }

  /// Extract and build every upload concurrently. The result is in input
  /// order. The first failure aborts the remaining tasks.
  async fn extract_all(
    &self,
    subject_id: Uuid,
    submitted_at: DateTime<Utc>,
    batch: Vec<Upload>,
  ) -> Result<Vec<Document>> {
    let mut slots: Vec<Option<Document>> = vec![None; batch.len()];
    let mut tasks = JoinSet::new();

    for (index, upload) in batch.into_iter().enumerate() {
      let extractor = Arc::clone(&self.extractor);
      let permits = Arc::clone(&self.permits);

      tasks.spawn(async move {
        let _permit = permits.acquire_owned().await.map_err(|_| Error::PoolClosed)?;
        let text = extractor.extract(&upload.filename, &upload.content).await?;
        let document = Document::build(upload.filename, text, subject_id, submitted_at)?;
        Ok::<_, Error>((index, document))
      });
    }

    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok(Ok((index, document))) => slots[index] = Some(document),
        Ok(Err(err)) => {
          tasks.abort_all();
          return Err(err);
        }
        Err(join_err) => {
          tasks.abort_all();
          return Err(Error::Task(join_err));
        }
      }
    }

    Ok(slots.into_iter().flatten().collect())
  }

  /// Best-effort compensating deletes. Failures are logged, never returned.
  async fn rollback(&self, subject_id: Uuid) {
    match self.store.delete_documents_by_subject(subject_id).await {
      Ok(count) => tracing::info!(%subject_id, count, "rolled back documents"),
      Err(e) => {
        tracing::error!(%subject_id, error = %e, "rollback could not delete documents");
      }
    }
    if let Err(e) = self.store.delete_subject(subject_id).await {
      tracing::error!(%subject_id, error = %e, "rollback could not delete subject");
    }
  }
}

impl<S, O> Ingestor<S, O>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  /// Record a pending job and ingest `batch` in the background.
  ///
  /// Returns as soon as the job is stored. Invalid input is rejected here,
  /// before any job exists; everything else is reported through the job's
  /// final status.
  pub async fn submit(&self, batch: Vec<Upload>, name: String) -> Result<IngestJob> {
    validate(&batch, &name)?;

    let job = IngestJob::pending(name.clone(), batch.len());
    self.store.create_job(&job).await.map_err(Error::store)?;

    let job_id = job.job_id;
    let this = self.clone();
    tokio::spawn(async move {
      let status = match this.ingest(batch, &name).await {
        Ok(subject_id) => JobStatus::Succeeded { subject_id },
        Err(err) => JobStatus::Failed { reason: err.to_string() },
      };
      tracing::info!(%job_id, status = status.discriminant(), "ingestion job finished");

      if let Err(e) = this.store.finish_job(job_id, status).await {
        tracing::error!(%job_id, error = %e, "could not record job outcome");
      }
    });

    Ok(job)
  }
}

fn validate(batch: &[Upload], name: &str) -> Result<()> {
  if name.trim().is_empty() {
    return Err(doc2quiz_core::Error::EmptySubjectName.into());
  }
  if batch.is_empty() {
    return Err(doc2quiz_core::Error::EmptyBatch.into());
  }
  if batch.iter().any(|upload| upload.filename.is_empty()) {
    return Err(doc2quiz_core::Error::EmptyFilename.into());
  }
  Ok(())
}
