//! Configuration for the doc2quiz server binary.
//!
//! Values are layered: built-in defaults, then the optional TOML file, then
//! `DOC2QUIZ__*` environment variables (nested keys separated by `__`).

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use doc2quiz_core::ocr::{OcrOptions, ResultFormat};
use doc2quiz_ingest::IngestConfig;
use doc2quiz_llamaparse::LlamaParseConfig;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  /// Largest request body accepted by `POST /upload`.
  pub max_upload_bytes: usize,
  pub store:            StoreConfig,
  pub ocr:              OcrConfig,
  pub ingest:           IngestSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
  /// SQLite database file. A leading `~/` is expanded.
  pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
  pub base_url:         String,
  pub api_key:          String,
  pub result_format:    ResultFormat,
  pub verbose:          bool,
  pub poll_interval_ms: u64,
  pub timeout_secs:     u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestSection {
  pub max_concurrent_extractions: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "0.0.0.0".to_string(),
      port:             8000,
      max_upload_bytes: 50 * 1024 * 1024,
      store:            StoreConfig::default(),
      ocr:              OcrConfig::default(),
      ingest:           IngestSection::default(),
    }
  }
}

impl Default for StoreConfig {
  fn default() -> Self { Self { path: PathBuf::from("doc2quiz.db") } }
}

impl Default for OcrConfig {
  fn default() -> Self {
    let client = LlamaParseConfig::default();
    Self {
      base_url:         client.base_url,
      api_key:          client.api_key,
      result_format:    ResultFormat::default(),
      verbose:          true,
      poll_interval_ms: client.poll_interval.as_millis() as u64,
      timeout_secs:     client.timeout.as_secs(),
    }
  }
}

impl Default for IngestSection {
  fn default() -> Self {
    Self { max_concurrent_extractions: IngestConfig::default().max_concurrent_extractions }
  }
}

impl ServerConfig {
  /// Load from `path` (optional) and the process environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::load_with(path, environment())
  }

  fn load_with(path: &Path, env: Environment) -> Result<Self, ConfigError> {
    Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(env)
      .build()?
      .try_deserialize()
  }

  /// Store path with a leading `~/` expanded to `$HOME`.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store.path) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn llamaparse(&self) -> LlamaParseConfig {
    LlamaParseConfig {
      base_url:      self.ocr.base_url.clone(),
      api_key:       self.ocr.api_key.clone(),
      poll_interval: Duration::from_millis(self.ocr.poll_interval_ms),
      timeout:       Duration::from_secs(self.ocr.timeout_secs),
    }
  }

  pub fn ingest(&self) -> IngestConfig {
    IngestConfig {
      max_concurrent_extractions: self.ingest.max_concurrent_extractions,
      ocr:                        OcrOptions {
        result_format: self.ocr.result_format,
        verbose:       self.ocr.verbose,
      },
    }
  }
}

fn environment() -> Environment {
  Environment::with_prefix("DOC2QUIZ").prefix_separator("__").separator("__")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
