//! [`SqliteStore`], the SQLite implementation of [`DocumentStore`] and
//! [`JobStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use doc2quiz_core::{
  document::Document,
  job::{IngestJob, JobStatus},
  store::{DocumentStore, JobStore},
  subject::Subject,
};

use crate::{
  encode::{
    encode_dt, encode_job_status, encode_metadata, encode_refs, encode_uuid, RawDocument,
    RawJob, RawSubject,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A doc2quiz store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_documents(&self, documents: &[Document]) -> Result<()> {
    let rows = documents
      .iter()
      .map(|doc| {
        Ok((
          encode_uuid(doc.document_id),
          encode_uuid(doc.subject_id),
          doc.filename.clone(),
          doc.ocr_text.clone(),
          encode_dt(doc.uploaded_at),
          encode_metadata(&doc.metadata)?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO documents (
               document_id, subject_id, filename, ocr_text, uploaded_at, metadata
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (document_id, subject_id, filename, ocr_text, uploaded_at, metadata) in &rows {
            stmt.execute(rusqlite::params![
              document_id,
              subject_id,
              filename,
              ocr_text,
              uploaded_at,
              metadata,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_subject(&self, subject: &Subject) -> Result<()> {
    let id_str       = encode_uuid(subject.subject_id);
    let name         = subject.name.clone();
    let user_id      = subject.user_id.clone();
    let at_str       = encode_dt(subject.created_at);
    let refs_str     = encode_refs(&subject.documents)?;
    let metadata_str = encode_metadata(&subject.metadata)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, name, user_id, created_at, documents, metadata)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, user_id, at_str, refs_str, metadata_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Deletes ───────────────────────────────────────────────────────────────

  async fn delete_documents_by_subject(&self, subject_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(subject_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM documents WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    tracing::debug!(%subject_id, count = deleted, "deleted documents");
    Ok(deleted as u64)
  }

  async fn delete_subject(&self, subject_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(subject_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_subject(&self, subject_id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(subject_id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM subjects WHERE subject_id = ?1", RawSubject::COLUMNS),
            rusqlite::params![id_str],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>> {
    let raws: Vec<RawSubject> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM subjects ORDER BY created_at DESC, rowid DESC",
          RawSubject::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(document_id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM documents WHERE document_id = ?1", RawDocument::COLUMNS),
            rusqlite::params![id_str],
            RawDocument::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self, subject_id: Uuid) -> Result<Vec<Document>> {
    let id_str = encode_uuid(subject_id);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM documents WHERE subject_id = ?1 ORDER BY seq",
          RawDocument::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }
}

// ─── JobStore impl ───────────────────────────────────────────────────────────

impl JobStore for SqliteStore {
  type Error = Error;

  async fn create_job(&self, job: &IngestJob) -> Result<()> {
    let id_str       = encode_uuid(job.job_id);
    let subject_name = job.subject_name.clone();
    let file_count   = job.file_count as i64;
    let submitted_at = encode_dt(job.submitted_at);
    let finished_at  = job.finished_at.map(encode_dt);
    let (status, subject_id, reason) = encode_job_status(&job.status);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO jobs (
             job_id, subject_name, file_count, status,
             subject_id, reason, submitted_at, finished_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            subject_name,
            file_count,
            status,
            subject_id,
            reason,
            submitted_at,
            finished_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn finish_job(&self, job_id: Uuid, status: JobStatus) -> Result<IngestJob> {
    let id_str      = encode_uuid(job_id);
    let finished_at = encode_dt(Utc::now());
    let (status_str, subject_id, reason) = encode_job_status(&status);

    // (rows updated, job exists)
    let (updated, exists): (usize, bool) = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE jobs
             SET status = ?2, subject_id = ?3, reason = ?4, finished_at = ?5
           WHERE job_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str, status_str, subject_id, reason, finished_at],
        )?;
        if updated > 0 {
          return Ok((updated, true));
        }
        let exists = conn
          .query_row(
            "SELECT 1 FROM jobs WHERE job_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok((updated, exists))
      })
      .await?;

    if !exists {
      return Err(Error::JobNotFound(job_id));
    }
    if updated == 0 {
      return Err(Error::JobAlreadyFinished(job_id));
    }

    self.get_job(job_id).await?.ok_or(Error::JobNotFound(job_id))
  }

  async fn get_job(&self, job_id: Uuid) -> Result<Option<IngestJob>> {
    let id_str = encode_uuid(job_id);

    let raw: Option<RawJob> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM jobs WHERE job_id = ?1", RawJob::COLUMNS),
            rusqlite::params![id_str],
            RawJob::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawJob::into_job).transpose()
  }
}
