//! Subject: a named group of documents uploaded together.
//!
//! A subject carries only lightweight `(id, filename)` references to its
//! documents, so listing a subject never requires reading document bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{Document, Metadata};

/// A projection of a [`Document`] stored inside its subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
  pub document_id: Uuid,
  pub filename:    String,
}

impl From<&Document> for DocumentRef {
  fn from(doc: &Document) -> Self {
    Self { document_id: doc.document_id, filename: doc.filename.clone() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id: Uuid,
  pub name:       String,
  /// Owner label. Uploads are unauthenticated, so this is normally `None`.
  pub user_id:    Option<String>,
  pub created_at: DateTime<Utc>,
  /// Document references in upload order.
  pub documents:  Vec<DocumentRef>,
  #[serde(default)]
  pub metadata:   Metadata,
}

impl Subject {
  /// Assemble a subject over already-built documents, keeping their order.
  pub fn new(
    subject_id: Uuid,
    name: impl Into<String>,
    created_at: DateTime<Utc>,
    documents: &[Document],
  ) -> Self {
    Self {
      subject_id,
      name: name.into(),
      user_id: None,
      created_at,
      documents: documents.iter().map(DocumentRef::from).collect(),
      metadata: Metadata::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_projects_documents_in_order() {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let docs = vec![
      Document::build("z.pdf", "z", id, now).unwrap(),
      Document::build("a.txt", "a", id, now).unwrap(),
    ];

    let subject = Subject::new(id, "Biology", now, &docs);

    assert_eq!(subject.name, "Biology");
    assert_eq!(subject.user_id, None);
    let names: Vec<_> = subject.documents.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, ["z.pdf", "a.txt"]);
    assert_eq!(subject.documents[0].document_id, docs[0].document_id);
  }
}
