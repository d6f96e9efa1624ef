//! [`LlamaParse`], an async HTTP client for the LlamaParse parsing API.

use std::{path::Path, time::Duration};

use doc2quiz_core::ocr::{OcrOptions, OcrService, ResultFormat};
use reqwest::{Client, Response, multipart};
use serde::Deserialize;
use tokio::time::Instant;

use crate::{Error, Result};

/// Connection settings for the LlamaParse API.
#[derive(Debug, Clone)]
pub struct LlamaParseConfig {
  pub base_url:      String,
  pub api_key:       String,
  /// Delay between job status checks.
  pub poll_interval: Duration,
  /// Upper bound on how long a single parse may take, upload included.
  pub timeout:       Duration,
}

impl Default for LlamaParseConfig {
  fn default() -> Self {
    Self {
      base_url:      "https://api.cloud.llamaindex.ai".to_string(),
      api_key:       String::new(),
      poll_interval: Duration::from_secs(1),
      timeout:       Duration::from_secs(300),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JobResponse {
  id:            String,
  /// Kept raw so unexpected states can be reported verbatim.
  status:        String,
  #[serde(default)]
  error_message: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async client for LlamaParse.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct LlamaParse {
  client: Client,
  config: LlamaParseConfig,
}

impl LlamaParse {
  pub fn new(config: LlamaParseConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api/v1/parsing{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// `POST /api/v1/parsing/upload`, returning the parse job id.
  async fn upload(&self, path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|source| Error::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());

    let form = multipart::Form::new()
      .part("file", multipart::Part::bytes(bytes).file_name(file_name));

    let resp = self
      .client
      .post(self.url("/upload"))
      .bearer_auth(&self.config.api_key)
      .multipart(form)
      .send()
      .await?;

    let job: JobResponse = check(resp).await?.json().await?;
    Ok(job.id)
  }

  /// `GET /api/v1/parsing/job/{id}` until the job settles or time runs out.
  async fn wait(&self, job_id: &str, verbose: bool) -> Result<()> {
    let started = Instant::now();

    loop {
      let resp = self
        .client
        .get(self.url(&format!("/job/{job_id}")))
        .bearer_auth(&self.config.api_key)
        .send()
        .await?;
      let job: JobResponse = check(resp).await?.json().await?;

      if verbose {
        tracing::info!(job_id, status = %job.status, "parse job status");
      } else {
        tracing::debug!(job_id, status = %job.status, "parse job status");
      }

      // Only PENDING is worth waiting on; anything else is final.
      match job.status.as_str() {
        "PENDING" => {}
        "SUCCESS" => return Ok(()),
        "ERROR" => {
          return Err(Error::JobFailed {
            job_id:  job_id.to_string(),
            message: job.error_message.unwrap_or_else(|| "unknown error".to_string()),
          });
        }
        "CANCELLED" | "CANCELED" => return Err(Error::JobCancelled(job_id.to_string())),
        other => {
          return Err(Error::JobFailed {
            job_id:  job_id.to_string(),
            message: format!("unexpected job status {other}"),
          });
        }
      }

      let waited = started.elapsed();
      if waited >= self.config.timeout {
        return Err(Error::Timeout { job_id: job_id.to_string(), waited });
      }
      tokio::time::sleep(self.config.poll_interval).await;
    }
  }

  /// `GET /api/v1/parsing/job/{id}/result/{format}`
  async fn fetch_result(&self, job_id: &str, format: ResultFormat) -> Result<String> {
    let resp = self
      .client
      .get(self.url(&format!("/job/{job_id}/result/{}", format.as_str())))
      .bearer_auth(&self.config.api_key)
      .send()
      .await?;
    let body: serde_json::Value = check(resp).await?.json().await?;

    // A parse that produced nothing comes back without the field.
    Ok(
      body
        .get(format.as_str())
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string(),
    )
  }
}

/// Turn a non-2xx response into [`Error::Status`], keeping the body text.
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(Error::Status { status: status.as_u16(), body })
}

// ─── OcrService impl ─────────────────────────────────────────────────────────

impl OcrService for LlamaParse {
  type Error = Error;

  async fn extract(&self, path: &Path, options: &OcrOptions) -> Result<String> {
    let job_id = self.upload(path).await?;
    tracing::debug!(%job_id, path = %path.display(), "uploaded file for parsing");

    self.wait(&job_id, options.verbose).await?;
    self.fetch_result(&job_id, options.result_format).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{
    io::Write as _,
    sync::{
      Arc,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use axum::{
    Json, Router,
    extract::{Multipart, Path as AxumPath, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
  };
  use serde_json::json;

  #[derive(Clone, Default)]
  struct Mock {
    polls:          Arc<AtomicUsize>,
    /// How many status checks report PENDING before settling.
    pending_polls:  usize,
    final_status:   &'static str,
    uploaded_names: Arc<std::sync::Mutex<Vec<String>>>,
  }

  async fn upload(
    State(mock): State<Mock>,
    headers: HeaderMap,
    mut multipart: Multipart,
  ) -> impl IntoResponse {
    let mut names = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
      if field.name() == Some("file") {
        names.push(field.file_name().unwrap_or_default().to_string());
        let _ = field.bytes().await;
      }
    }
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-key") {
      return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid API key" })));
    }
    mock.uploaded_names.lock().unwrap().extend(names);
    (StatusCode::OK, Json(json!({ "id": "job-1", "status": "PENDING" })))
  }

  async fn status(State(mock): State<Mock>, AxumPath(id): AxumPath<String>) -> Json<serde_json::Value> {
    let n = mock.polls.fetch_add(1, Ordering::SeqCst);
    let status = if n < mock.pending_polls { "PENDING" } else { mock.final_status };
    Json(json!({ "id": id, "status": status, "error_message": "unsupported file" }))
  }

  async fn markdown() -> Json<serde_json::Value> {
    Json(json!({ "markdown": "# Parsed\n\nbody", "job_metadata": {} }))
  }

  async fn text() -> Json<serde_json::Value> { Json(json!({ "job_metadata": {} })) }

  async fn serve(mock: Mock) -> String {
    let app = Router::new()
      .route("/api/v1/parsing/upload", post(upload))
      .route("/api/v1/parsing/job/{id}", get(status))
      .route("/api/v1/parsing/job/{id}/result/markdown", get(markdown))
      .route("/api/v1/parsing/job/{id}/result/text", get(text))
      .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn client(base_url: String, api_key: &str, timeout: Duration) -> LlamaParse {
    LlamaParse::new(LlamaParseConfig {
      base_url,
      api_key: api_key.to_string(),
      poll_interval: Duration::from_millis(5),
      timeout,
    })
    .unwrap()
  }

  fn pdf() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(b"%PDF-1.4 fake").unwrap();
    file
  }

  #[tokio::test]
  async fn extract_polls_until_success_and_returns_markdown() {
    let mock = Mock { pending_polls: 2, final_status: "SUCCESS", ..Default::default() };
    let base = serve(mock.clone()).await;
    let file = pdf();

    let text = client(base, "test-key", Duration::from_secs(5))
      .extract(file.path(), &OcrOptions::default())
      .await
      .unwrap();

    assert_eq!(text, "# Parsed\n\nbody");
    assert_eq!(mock.polls.load(Ordering::SeqCst), 3);
    let names = mock.uploaded_names.lock().unwrap().clone();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".pdf"), "uploaded as {names:?}");
  }

  #[tokio::test]
  async fn missing_result_field_is_empty_text() {
    let mock = Mock { final_status: "SUCCESS", ..Default::default() };
    let base = serve(mock).await;
    let file = pdf();
    let options = OcrOptions { result_format: ResultFormat::Text, verbose: true };

    let text = client(base, "test-key", Duration::from_secs(5))
      .extract(file.path(), &options)
      .await
      .unwrap();

    assert_eq!(text, "");
  }

  #[tokio::test]
  async fn failed_job_surfaces_service_message() {
    let mock = Mock { final_status: "ERROR", ..Default::default() };
    let base = serve(mock).await;
    let file = pdf();

    let err = client(base, "test-key", Duration::from_secs(5))
      .extract(file.path(), &OcrOptions::default())
      .await
      .unwrap_err();

    assert!(matches!(
      err,
      Error::JobFailed { ref message, .. } if message == "unsupported file"
    ));
  }

  #[tokio::test]
  async fn cancelled_job_fails_on_first_check() {
    let mock = Mock { final_status: "CANCELLED", ..Default::default() };
    let base = serve(mock.clone()).await;
    let file = pdf();

    let err = client(base, "test-key", Duration::from_secs(5))
      .extract(file.path(), &OcrOptions::default())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::JobCancelled(ref id) if id == "job-1"));
    assert_eq!(err.to_string(), "parse job job-1 was cancelled");
    assert_eq!(mock.polls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn unrecognised_status_fails_on_first_check() {
    let mock = Mock { pending_polls: 1, final_status: "PARTIAL_SUCCESS", ..Default::default() };
    let base = serve(mock.clone()).await;
    let file = pdf();

    let err = client(base, "test-key", Duration::from_secs(5))
      .extract(file.path(), &OcrOptions::default())
      .await
      .unwrap_err();

    assert!(matches!(
      err,
      Error::JobFailed { ref message, .. } if message.contains("PARTIAL_SUCCESS")
    ));
    assert_eq!(mock.polls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn bad_api_key_is_status_error() {
    let base = serve(Mock::default()).await;
    let file = pdf();

    let err = client(base, "wrong", Duration::from_secs(5))
      .extract(file.path(), &OcrOptions::default())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Status { status: 401, .. }));
  }

  #[tokio::test]
  async fn job_that_never_settles_times_out() {
    let mock = Mock { pending_polls: usize::MAX, final_status: "SUCCESS", ..Default::default() };
    let base = serve(mock).await;
    let file = pdf();

    let err = client(base, "test-key", Duration::from_millis(50))
      .extract(file.path(), &OcrOptions::default())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }));
  }

  #[tokio::test]
  async fn unreadable_file_is_read_error() {
    let base = serve(Mock::default()).await;
    let err = client(base, "test-key", Duration::from_secs(5))
      .extract(Path::new("/nonexistent/doc.pdf"), &OcrOptions::default())
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Read { .. }));
  }
}
