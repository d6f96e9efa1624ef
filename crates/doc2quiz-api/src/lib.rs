//! JSON REST API for doc2quiz.
//!
//! Exposes an axum [`Router`] that accepts uploads and serves the subjects,
//! documents and ingestion jobs they produce. Any backend implementing both
//! [`DocumentStore`] and [`JobStore`] can sit behind it.
//! Auth and TLS are the caller's responsibility.

pub mod error;
pub mod jobs;
pub mod subjects;
pub mod upload;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use doc2quiz_core::{
  ocr::OcrService,
  store::{DocumentStore, JobStore},
};
use doc2quiz_ingest::Ingestor;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, O> {
  pub store:    Arc<S>,
  pub ingestor: Ingestor<S, O>,
}

impl<S, O> Clone for AppState<S, O> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), ingestor: self.ingestor.clone() }
  }
}

impl<S, O> AppState<S, O>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  /// State whose reads and ingestions go through the ingestor's store.
  pub fn new(ingestor: Ingestor<S, O>) -> Self {
    Self { store: Arc::clone(ingestor.store()), ingestor }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// Request bodies larger than `max_upload_bytes` are rejected.
pub fn api_router<S, O>(state: AppState<S, O>, max_upload_bytes: usize) -> Router<()>
where
  S: DocumentStore + JobStore + 'static,
  O: OcrService + 'static,
{
  Router::new()
    .route("/", get(root))
    // Uploads
    .route("/upload", post(upload::handler::<S, O>))
    .route("/jobs/{id}", get(jobs::get_one::<S, O>))
    // Subjects
    .route("/subjects", get(subjects::list::<S, O>))
    .route(
      "/subjects/{id}",
      get(subjects::get_one::<S, O>).delete(subjects::delete_one::<S, O>),
    )
    .route("/subjects/{id}/documents", get(subjects::documents::<S, O>))
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /`, a liveness probe.
async fn root() -> Json<Value> { Json(json!({ "message": "Hello World" })) }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::{path::Path, time::Duration};

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use doc2quiz_core::ocr::OcrOptions;
  use doc2quiz_ingest::IngestConfig;
  use doc2quiz_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const BOUNDARY: &str = "doc2quiz-test-boundary";

  /// Returns `parsed:<content>`, or fails when the file holds `FAIL`.
  struct EchoOcr;

  impl OcrService for EchoOcr {
    type Error = std::io::Error;

    async fn extract(&self, path: &Path, _options: &OcrOptions) -> std::io::Result<String> {
      let content = tokio::fs::read_to_string(path).await?;
      if content == "FAIL" {
        return Err(std::io::Error::other("parser rejected the file"));
      }
      Ok(format!("parsed:{content}"))
    }
  }

  enum Part<'a> {
    File { filename: Option<&'a str>, content: &'a str },
    Text { name: &'a str, value: &'a str },
  }

  fn multipart_body(parts: &[Part<'_>]) -> String {
    let mut body = String::new();
    for part in parts {
      body.push_str(&format!("--{BOUNDARY}\r\n"));
      match part {
        Part::File { filename: Some(filename), content } => {
          body.push_str(&format!(
            "Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
          ));
        }
        Part::File { filename: None, content } => {
          body.push_str(&format!(
            "Content-Disposition: form-data; name=\"files\"\r\n\r\n{content}\r\n"
          ));
        }
        Part::Text { name, value } => {
          body.push_str(&format!(
            "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
          ));
        }
      }
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
  }

  async fn app() -> Router {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let ingestor = Ingestor::new(store, Arc::new(EchoOcr), IngestConfig::default());
    api_router(AppState::new(ingestor), 1024 * 1024)
  }

  async fn send(app: &Router, method: &str, uri: &str) -> Response {
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(req).await.unwrap()
  }

  async fn upload(app: &Router, parts: &[Part<'_>]) -> Response {
    let req = Request::builder()
      .method("POST")
      .uri("/upload")
      .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
      .body(Body::from(multipart_body(parts)))
      .unwrap();
    app.clone().oneshot(req).await.unwrap()
  }

  async fn json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..200 {
      let job = json(send(app, "GET", &format!("/jobs/{job_id}")).await).await;
      if job["status"] != "pending" {
        return job;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not finish");
  }

  // ── Root ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn root_says_hello() {
    let app = app().await;
    let resp = send(&app, "GET", "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await, json!({ "message": "Hello World" }));
  }

  // ── Upload ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn upload_returns_200_and_job_succeeds() {
    let app = app().await;
    let resp = upload(&app, &[
      Part::File { filename: Some("a.txt"), content: "hello" },
      Part::File { filename: Some("b.pdf"), content: "scan" },
      Part::Text { name: "name", value: "Biology" },
    ])
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json(resp).await;
    assert_eq!(body["message"], "Documents uploaded successfully");
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let job = wait_for_job(&app, &job_id).await;
    assert_eq!(job["status"], "succeeded", "job: {job}");
    assert_eq!(job["file_count"], 2);
    let subject_id = job["subject_id"].as_str().unwrap();

    let subject = json(send(&app, "GET", &format!("/subjects/{subject_id}")).await).await;
    assert_eq!(subject["name"], "Biology");
    assert_eq!(subject["documents"][0]["filename"], "a.txt");
    assert_eq!(subject["documents"][1]["filename"], "b.pdf");

    let documents =
      json(send(&app, "GET", &format!("/subjects/{subject_id}/documents")).await).await;
    assert_eq!(documents[0]["ocr_text"], "hello");
    assert_eq!(documents[1]["ocr_text"], "parsed:scan");
  }

  #[tokio::test]
  async fn failed_ingestion_is_reported_on_the_job() {
    let app = app().await;
    let resp = upload(&app, &[
      Part::File { filename: Some("ok.txt"), content: "fine" },
      Part::File { filename: Some("bad.pdf"), content: "FAIL" },
      Part::Text { name: "name", value: "Doomed" },
    ])
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let job_id = json(resp).await["job_id"].as_str().unwrap().to_string();

    let job = wait_for_job(&app, &job_id).await;
    assert_eq!(job["status"], "failed");
    assert!(job["reason"].as_str().unwrap().contains("bad.pdf"), "job: {job}");

    let subjects = json(send(&app, "GET", "/subjects").await).await;
    assert_eq!(subjects, json!([]));
  }

  #[tokio::test]
  async fn upload_without_files_is_422() {
    let app = app().await;
    let resp = upload(&app, &[Part::Text { name: "name", value: "Empty" }]).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json(resp).await["error"].as_str().unwrap().contains("files"));
  }

  #[tokio::test]
  async fn upload_without_name_is_422() {
    let app = app().await;
    let resp = upload(&app, &[Part::File { filename: Some("a.txt"), content: "x" }]).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn upload_with_blank_name_is_422() {
    let app = app().await;
    let resp = upload(&app, &[
      Part::File { filename: Some("a.txt"), content: "x" },
      Part::Text { name: "name", value: "  " },
    ])
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn file_part_without_filename_is_422() {
    let app = app().await;
    let resp = upload(&app, &[
      Part::File { filename: None, content: "x" },
      Part::Text { name: "name", value: "Anonymous" },
    ])
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  #[tokio::test]
  async fn non_multipart_body_is_400() {
    let app = app().await;
    let req = Request::builder()
      .method("POST")
      .uri("/upload")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("{}"))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Reads ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_ids_are_404() {
    let app = app().await;
    let id = Uuid::new_v4();
    for uri in [
      format!("/jobs/{id}"),
      format!("/subjects/{id}"),
      format!("/subjects/{id}/documents"),
    ] {
      let resp = send(&app, "GET", &uri).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {uri}");
    }
  }

  // ── Delete ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn delete_subject_returns_204_then_404() {
    let app = app().await;
    let resp = upload(&app, &[
      Part::File { filename: Some("a.md"), content: "# A" },
      Part::Text { name: "name", value: "Short-lived" },
    ])
    .await;
    let job_id = json(resp).await["job_id"].as_str().unwrap().to_string();
    let job = wait_for_job(&app, &job_id).await;
    let subject_id = job["subject_id"].as_str().unwrap().to_string();

    let del = send(&app, "DELETE", &format!("/subjects/{subject_id}")).await;
    assert_eq!(del.status(), StatusCode::NO_CONTENT);

    let get = send(&app, "GET", &format!("/subjects/{subject_id}")).await;
    assert_eq!(get.status(), StatusCode::NOT_FOUND);

    let again = send(&app, "DELETE", &format!("/subjects/{subject_id}")).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
  }
}
