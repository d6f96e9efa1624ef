//! Ingestion jobs, the status channel for background uploads.
//!
//! An upload is acknowledged before its files are processed. The job record
//! is what a caller polls to learn whether the subject was actually created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where an ingestion job currently stands.
///
/// Transitions are one-way: `Pending` → `Succeeded` | `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
  Pending,
  Succeeded { subject_id: Uuid },
  Failed { reason: String },
}

impl JobStatus {
  pub fn is_finished(&self) -> bool { !matches!(self, Self::Pending) }

  /// Stable discriminant used by storage backends.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Succeeded { .. } => "succeeded",
      Self::Failed { .. } => "failed",
    }
  }
}

// ─── Job record ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestJob {
  pub job_id:       Uuid,
  pub subject_name: String,
  pub file_count:   usize,
  #[serde(flatten)]
  pub status:       JobStatus,
  pub submitted_at: DateTime<Utc>,
  pub finished_at:  Option<DateTime<Utc>>,
}

impl IngestJob {
  /// A freshly submitted job, not yet picked up.
  pub fn pending(subject_name: impl Into<String>, file_count: usize) -> Self {
    Self {
      job_id: Uuid::new_v4(),
      subject_name: subject_name.into(),
      file_count,
      status: JobStatus::Pending,
      submitted_at: Utc::now(),
      finished_at: None,
    }
  }
}
