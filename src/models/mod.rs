//! Domain models for the rostersync import pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Employee`] - A committed roster record
//! - [`EmployeeDraft`] - Copy-on-write partial record parsed from one CSV line
//! - [`PreviewRow`] - One prospective record, not yet committed
//! - [`ImportPreview`] - An ephemeral import session (rows + snapshot marker)
//! - [`Role`] / [`EmployeeStatus`] - Closed domain enums

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder team assigned to new rows with a blank team when
/// auto-create was enabled.
pub const UNASSIGNED_TEAM: &str = "Unassigned";

// =============================================================================
// Role
// =============================================================================

/// Role of an employee within the organization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Employee,
    Manager,
}

impl Role {
    /// Parse a role from a CSV cell. Lenient about case and common spellings.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "employee" | "member" | "staff" => Some(Self::Employee),
            "manager" | "lead" => Some(Self::Manager),
            _ => None,
        }
    }
}

// =============================================================================
// Employee Status
// =============================================================================

/// Lifecycle status of a roster record.
///
/// Status only moves via defined operations (archive, server-reported
/// activation/bounce). There is no hard delete; archived records remain
/// addressable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmployeeStatus {
    /// Invitation sent, not yet accepted.
    Invited,
    /// Invitation accepted.
    Active,
    /// Invitation email bounced.
    Bounced,
    /// Archived; excluded from active flows but never deleted.
    Archived,
}

// =============================================================================
// Employee
// =============================================================================

/// A committed employee roster record.
///
/// Invariant: `email` is unique (case-insensitive) across the roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identity, synthesized at creation.
    pub id: Uuid,
    /// Unique identity key, compared case-insensitively.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub team: String,
    pub role: Role,
    pub status: EmployeeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
}

impl Employee {
    /// Canonical lookup key for case-insensitive email identity.
    pub fn email_key(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

// =============================================================================
// Employee Draft
// =============================================================================

/// Partial employee record parsed from a single CSV data line.
///
/// A draft is copy-on-write: it never aliases a committed record, and its
/// fields reach the roster only through the applier. Absent CSV cells stay
/// `None` so a partial merge can tell "not provided" from "blank".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
}

impl EmployeeDraft {
    /// Canonical lookup key, when an email was provided.
    pub fn email_key(&self) -> Option<String> {
        self.email.as_deref().map(|e| e.trim().to_lowercase())
    }
}

// =============================================================================
// Preview Row
// =============================================================================

/// Classification of one preview row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    /// No existing record shares the email; applying creates a record.
    New,
    /// An existing record shares the email; applying merges into it.
    Update,
    /// Failed validation; excluded from apply.
    Error,
}

/// An intermediate, not-yet-committed representation of one prospective
/// employee record derived from a single CSV line.
///
/// Ephemeral: created by the parse/validate/resolve chain, consumed once by
/// the applier, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    /// 1-based position among the data lines of the source text.
    pub row_index: usize,
    pub draft: EmployeeDraft,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PreviewRow {
    /// A row that passed validation, tentatively `new` until resolved.
    pub fn new(row_index: usize, draft: EmployeeDraft) -> Self {
        Self {
            row_index,
            draft,
            status: RowStatus::New,
            error_message: None,
        }
    }

    /// A row rejected by validation, carrying the first failing rule.
    pub fn error(row_index: usize, draft: EmployeeDraft, message: impl Into<String>) -> Self {
        Self {
            row_index,
            draft,
            status: RowStatus::Error,
            error_message: Some(message.into()),
        }
    }
}

// =============================================================================
// Import Preview (session)
// =============================================================================

/// An ephemeral import session: the derived preview rows plus the roster
/// generation they were resolved against.
///
/// Lives only until apply or cancel; never persisted. The applier rejects
/// the preview when the roster generation has moved on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub rows: Vec<PreviewRow>,
    pub auto_create_team: bool,
    /// Roster generation the dedup snapshot was captured at.
    pub snapshot_generation: u64,
}

impl ImportPreview {
    pub fn stats(&self) -> PreviewStats {
        let mut stats = PreviewStats::default();
        for row in &self.rows {
            match row.status {
                RowStatus::New => stats.new += 1,
                RowStatus::Update => stats.updated += 1,
                RowStatus::Error => stats.errors += 1,
            }
        }
        stats
    }
}

/// Row counts per classification for one preview.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStats {
    pub new: usize,
    pub updated: usize,
    pub errors: usize,
}

// =============================================================================
// Tests
// =============================================================================
