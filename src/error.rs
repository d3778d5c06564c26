//! Error types for the rostersync import pipeline and request layer.
//!
//! This module defines a hierarchy of error types following best practices:
//!
//! - [`CsvError`] - CSV decoding errors
//! - [`RequestError`] - Request executor errors
//! - [`ImportError`] - Import pipeline errors
//! - [`ServerError`] - Top-level HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Per-row validation failures are deliberately *not* errors: they are
//! surfaced as annotated preview rows (see [`crate::models::PreviewRow`])
//! so a bad row never blocks processing of the others.

use thiserror::Error;

// =============================================================================
// Transport Failure Classification
// =============================================================================

/// Closed set of transport-level failure kinds.
///
/// Determined exactly once, at the transport boundary, and propagated as a
/// typed value. Downstream code never inspects error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The attempt exceeded its timeout. A late response is discarded.
    Timeout,
    /// Generic network failure (connection refused, reset, DNS, ...).
    Network,
    /// The server answered with a non-success HTTP status.
    HttpStatus(u16),
}

impl FailureKind {
    /// Whether the request executor may retry after this failure.
    ///
    /// Timeouts, network failures and HTTP 5xx are transient; everything
    /// else (notably 4xx) is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::HttpStatus(code) => *code >= 500,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network failure"),
            FailureKind::HttpStatus(code) => write!(f, "HTTP {}", code),
        }
    }
}

// =============================================================================
// CSV Decoding Errors
// =============================================================================

/// Errors while reading or decoding CSV input.
///
/// The parser itself is lenient and prefers absent fields over failing;
/// only I/O and encoding problems are structurally unrecoverable.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read input.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode bytes into text.
    #[error("Failed to decode input: {0}")]
    Encoding(String),
}

// =============================================================================
// Request Executor Errors
// =============================================================================

/// Errors surfaced by the request executor.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Terminal HTTP error (4xx). Carries the status and the
    /// server-provided message, surfaced immediately without retry.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The retry budget was spent without a success. Distinguished from a
    /// direct terminal HTTP error; [`RequestError::status`] reports 0.
    #[error("Request failed after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    /// A successful response carried a body that could not be decoded.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// A required configuration value was absent at construction time.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),
}

impl RequestError {
    /// HTTP status carried by the error. Exhaustion and undecodable bodies
    /// report 0, which callers can use to tell them apart from a 4xx.
    pub fn status(&self) -> u16 {
        match self {
            RequestError::Http { status, .. } => *status,
            _ => 0,
        }
    }
}

// =============================================================================
// Import Pipeline Errors
// =============================================================================

/// Errors from the import pipeline (preview + apply).
#[derive(Debug, Error)]
pub enum ImportError {
    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// The roster generation advanced between preview and apply. The
    /// preview is stale and must be re-run; nothing was committed.
    #[error("Roster changed since preview (generation {expected}, now {found}); re-run preview")]
    StaleSnapshot { expected: u64, found: u64 },
}

// =============================================================================
// Server Errors (top-level)
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Import pipeline error.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV decoding.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for request executor operations.
pub type RequestResult<T> = Result<T, RequestError>;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FailureKind::Timeout.is_retryable());
        assert!(FailureKind::Network.is_retryable());
        assert!(FailureKind::HttpStatus(500).is_retryable());
        assert!(FailureKind::HttpStatus(503).is_retryable());
        assert!(!FailureKind::HttpStatus(404).is_retryable());
        assert!(!FailureKind::HttpStatus(422).is_retryable());
    }

    #[test]
    fn test_request_error_status() {
        let terminal = RequestError::Http {
            status: 404,
            message: "not found".into(),
        };
        assert_eq!(terminal.status(), 404);

        let exhausted = RequestError::Exhausted {
            attempts: 3,
            message: "HTTP 500".into(),
        };
        assert_eq!(exhausted.status(), 0);
    }

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> ImportError
        let csv_err = CsvError::Encoding("bad bytes".into());
        let import_err: ImportError = csv_err.into();
        assert!(import_err.to_string().contains("bad bytes"));

        // ImportError -> ServerError
        let server_err: ServerError = import_err.into();
        assert!(server_err.to_string().contains("Import error"));
    }

    #[test]
    fn test_stale_snapshot_message() {
        let err = ImportError::StaleSnapshot {
            expected: 3,
            found: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("generation 3"));
        assert!(msg.contains("now 5"));
    }
}
