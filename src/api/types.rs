//! REST API types for dashboard integration.
//!
//! Wire format is camelCase JSON throughout; preview rows are returned
//! verbatim so the dashboard can render the confirmation table before
//! asking for apply.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::import::ApplyOutcome;
use crate::models::{ImportPreview, PreviewRow, PreviewStats};

/// Request body for preview and apply: pasted CSV text plus the
/// auto-create-team flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub csv_text: String,
    #[serde(default)]
    pub auto_create_team: bool,
}

/// Response sent after preview (pasted text or uploaded file).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Unique job identifier
    pub job_id: String,
    pub rows: Vec<PreviewRow>,
    pub stats: PreviewStats,
    /// Roster generation the preview was resolved against.
    pub snapshot_generation: u64,
    /// Parsing metadata, present for the file-upload path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_info: Option<CsvMetadata>,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<ImportPreview> for PreviewResponse {
    fn from(preview: ImportPreview) -> Self {
        let stats = preview.stats();
        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            stats,
            snapshot_generation: preview.snapshot_generation,
            rows: preview.rows,
            csv_info: None,
        }
    }
}

/// Response sent after a committed apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub job_id: String,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub generation: u64,
    pub roster_size: usize,
}

impl ApplyResponse {
    pub fn new(outcome: ApplyOutcome, roster_size: usize) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            created: outcome.created,
            updated: outcome.updated,
            skipped: outcome.skipped,
            generation: outcome.generation,
            roster_size,
        }
    }
}

/// Request body for the bulk archive endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub ids: Vec<Uuid>,
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
