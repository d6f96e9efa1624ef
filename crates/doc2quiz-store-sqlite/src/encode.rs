//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields
//! (metadata, document references) are stored as compact JSON. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use doc2quiz_core::{
  document::{Document, Metadata},
  job::{IngestJob, JobStatus},
  subject::{DocumentRef, Subject},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_metadata(m: &Metadata) -> Result<String> { Ok(serde_json::to_string(m)?) }

pub fn decode_metadata(s: &str) -> Result<Metadata> { Ok(serde_json::from_str(s)?) }

pub fn encode_refs(refs: &[DocumentRef]) -> Result<String> {
  Ok(serde_json::to_string(refs)?)
}

pub fn decode_refs(s: &str) -> Result<Vec<DocumentRef>> { Ok(serde_json::from_str(s)?) }

// ─── JobStatus ───────────────────────────────────────────────────────────────

/// Split a status into its `(status, subject_id, reason)` columns.
pub fn encode_job_status(
  status: &JobStatus,
) -> (&'static str, Option<String>, Option<String>) {
  let subject_id = match status {
    JobStatus::Succeeded { subject_id } => Some(encode_uuid(*subject_id)),
    _ => None,
  };
  let reason = match status {
    JobStatus::Failed { reason } => Some(reason.clone()),
    _ => None,
  };
  (status.discriminant(), subject_id, reason)
}

pub fn decode_job_status(
  status: &str,
  subject_id: Option<&str>,
  reason: Option<String>,
) -> Result<JobStatus> {
  match (status, subject_id) {
    ("pending", _) => Ok(JobStatus::Pending),
    ("succeeded", Some(id)) => Ok(JobStatus::Succeeded { subject_id: decode_uuid(id)? }),
    ("succeeded", None) => Err(Error::CorruptRow("succeeded job without subject_id".into())),
    ("failed", _) => Ok(JobStatus::Failed { reason: reason.unwrap_or_default() }),
    (other, _) => Err(Error::CorruptRow(format!("unknown job status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id: String,
  pub subject_id:  String,
  pub filename:    String,
  pub ocr_text:    String,
  pub uploaded_at: String,
  pub metadata:    String,
}

impl RawDocument {
  pub const COLUMNS: &'static str =
    "document_id, subject_id, filename, ocr_text, uploaded_at, metadata";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id: row.get(0)?,
      subject_id:  row.get(1)?,
      filename:    row.get(2)?,
      ocr_text:    row.get(3)?,
      uploaded_at: row.get(4)?,
      metadata:    row.get(5)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      subject_id:  decode_uuid(&self.subject_id)?,
      filename:    self.filename,
      ocr_text:    self.ocr_text,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      metadata:    decode_metadata(&self.metadata)?,
    })
  }
}

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id: String,
  pub name:       String,
  pub user_id:    Option<String>,
  pub created_at: String,
  pub documents:  String,
  pub metadata:   String,
}

impl RawSubject {
  pub const COLUMNS: &'static str =
    "subject_id, name, user_id, created_at, documents, metadata";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id: row.get(0)?,
      name:       row.get(1)?,
      user_id:    row.get(2)?,
      created_at: row.get(3)?,
      documents:  row.get(4)?,
      metadata:   row.get(5)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id: decode_uuid(&self.subject_id)?,
      name:       self.name,
      user_id:    self.user_id,
      created_at: decode_dt(&self.created_at)?,
      documents:  decode_refs(&self.documents)?,
      metadata:   decode_metadata(&self.metadata)?,
    })
  }
}

/// Raw strings read directly from a `jobs` row.
pub struct RawJob {
  pub job_id:       String,
  pub subject_name: String,
  pub file_count:   i64,
  pub status:       String,
  pub subject_id:   Option<String>,
  pub reason:       Option<String>,
  pub submitted_at: String,
  pub finished_at:  Option<String>,
}

impl RawJob {
  pub const COLUMNS: &'static str = "job_id, subject_name, file_count, status, \
                                     subject_id, reason, submitted_at, finished_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      job_id:       row.get(0)?,
      subject_name: row.get(1)?,
      file_count:   row.get(2)?,
      status:       row.get(3)?,
      subject_id:   row.get(4)?,
      reason:       row.get(5)?,
      submitted_at: row.get(6)?,
      finished_at:  row.get(7)?,
    })
  }

  pub fn into_job(self) -> Result<IngestJob> {
    let file_count = usize::try_from(self.file_count)
      .map_err(|_| Error::CorruptRow(format!("negative file_count: {}", self.file_count)))?;

    Ok(IngestJob {
      job_id: decode_uuid(&self.job_id)?,
      subject_name: self.subject_name,
      file_count,
      status: decode_job_status(&self.status, self.subject_id.as_deref(), self.reason)?,
      submitted_at: decode_dt(&self.submitted_at)?,
      finished_at: self.finished_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
