//! Persistence of validated analyses.
//!
//! Storing a record is advisory: the validated record is what the caller
//! gets, whether or not the write succeeds. [`crate::analyze::Analyzer`]
//! bounds each write with the API timeout, logs failures, and reports the
//! outcome in [`crate::analyze::AnalysisStats::persisted`].
//!
//! Two implementations ship:
//!
//! * [`FileStore`]: appends one JSON line per record to a local file.
//! * [`RestStore`]: inserts into a PostgREST table (`POST /rest/v1/{table}`),
//!   the interface Supabase exposes.

use crate::analysis::StructuredAnalysis;
use crate::error::PersistenceError;
use crate::mode::AnalysisMode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// What gets stored for one successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub image_urls: Vec<String>,
    pub mode: AnalysisMode,
    pub analysis: StructuredAnalysis,
    /// Vision and structuring model identifiers, `vision+structuring`.
    pub model_used: String,
    pub created_at: DateTime<Utc>,
}

/// A durable sink for analysis records.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(&self, record: &AnalysisRecord) -> Result<(), PersistenceError>;
}

// ── File store ───────────────────────────────────────────────────────────

/// Appends records as JSON lines.
///
/// Writes from concurrent requests are serialised so lines never interleave.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_failed(&self, e: impl std::fmt::Display) -> PersistenceError {
        PersistenceError::WriteFailed {
            detail: format!("{}: {e}", self.path.display()),
        }
    }
}

#[async_trait]
impl AnalysisStore for FileStore {
    async fn save(&self, record: &AnalysisRecord) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(record).map_err(|e| self.write_failed(e))?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_failed(e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_failed(e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.write_failed(e))?;
        file.flush().await.map_err(|e| self.write_failed(e))?;

        debug!("Appended analysis record to {}", self.path.display());
        Ok(())
    }
}

// ── PostgREST store ──────────────────────────────────────────────────────

/// Default table name for [`RestStore`].
pub const DEFAULT_TABLE: &str = "analyses";

/// Inserts records through a PostgREST endpoint.
pub struct RestStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl RestStore {
    /// `base_url` is the project URL, e.g. `https://abc.supabase.co`.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        table: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Self, PersistenceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PersistenceError::WriteFailed {
                detail: format!("http client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: table_endpoint(base_url, table.unwrap_or(DEFAULT_TABLE)),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

#[async_trait]
impl AnalysisStore for RestStore {
    async fn save(&self, record: &AnalysisRecord) -> Result<(), PersistenceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&RestRow::from(record))
            .send()
            .await
            .map_err(|e| PersistenceError::WriteFailed {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::WriteFailed {
                detail: format!("HTTP {status}: {body}"),
            });
        }
        Ok(())
    }
}

/// Row shape of the `analyses` table: one image column holding the first
/// reference, the rest kept alongside.
#[derive(Serialize)]
struct RestRow<'a> {
    image_url: &'a str,
    image_urls: &'a [String],
    mode: AnalysisMode,
    analysis: &'a StructuredAnalysis,
    model_used: &'a str,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a AnalysisRecord> for RestRow<'a> {
    fn from(r: &'a AnalysisRecord) -> Self {
        Self {
            image_url: r.image_urls.first().map(String::as_str).unwrap_or_default(),
            image_urls: &r.image_urls,
            mode: r.mode,
            analysis: &r.analysis,
            model_used: &r.model_used,
            created_at: r.created_at,
        }
    }
}
