//! # rostersync - Bulk employee roster import and synchronization
//!
//! rostersync ingests employee CSV uploads, previews them against the live
//! roster, and applies the accepted rows as one atomic replacement. All
//! remote operations go through a resilient request executor with
//! per-attempt timeouts, retry/backoff and typed error classification.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  CSV input  │──▶│   Parser    │──▶│  Validate +  │──▶│   Applier   │
//! │ (text/file) │   │ (auto-enc)  │   │   Resolve    │   │ (atomic)    │
//! └─────────────┘   └─────────────┘   └──────────────┘   └──────┬──────┘
//!                                                               ▼
//!                    ┌─────────────┐                     ┌─────────────┐
//!                    │ Bulk actions│────────────────────▶│ RosterStore │
//!                    │ (per-target)│   Request Executor  │ (generation)│
//!                    └─────────────┘                     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rostersync::{preview_text, apply, RosterStore};
//!
//! let store = RosterStore::new();
//! let preview = preview_text(csv_text, &store, false);
//! let outcome = apply(&preview, &store)?;
//! println!("created {} records", outcome.created);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Employee, PreviewRow, ImportPreview)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`validation`] - Per-row rule chain
//! - [`import`] - Preview pipeline and atomic applier
//! - [`store`] - Roster store with generation tracking
//! - [`request`] - Resilient request executor
//! - [`bulk`] - Bulk actions with per-target outcomes
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing & validation
pub mod parser;
pub mod validation;

// Import pipeline
pub mod import;

// Roster ownership
pub mod store;

// Network
pub mod request;

// Bulk actions
pub mod bulk;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, CsvResult, FailureKind, ImportError, ImportResult, RequestError, RequestResult,
    ServerError, ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Employee, EmployeeDraft, EmployeeStatus, ImportPreview, PreviewRow, PreviewStats, Role,
    RowStatus, UNASSIGNED_TEAM,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_text, unrecognized_columns, ParsedCsv, ParsedRow, RECOGNIZED_COLUMNS,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{validate_draft, validate_rows, RowVerdict, ERR_EMAIL, ERR_PHONE, ERR_TEAM};

// =============================================================================
// Re-exports - Import pipeline
// =============================================================================

pub use import::{apply, preview_bytes, preview_parsed, preview_text, ApplyOutcome, RosterSnapshot};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{RosterEvent, RosterStore};

// =============================================================================
// Re-exports - Request executor
// =============================================================================

pub use request::{ApiClient, RequestConfig};

// =============================================================================
// Re-exports - Bulk actions
// =============================================================================

pub use bulk::{archive, assign_team, resend_invite, BulkOutcome};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
