//! Dedup/merge resolution against a roster snapshot.
//!
//! Each validated row is classified as `new` or `update` by case-insensitive
//! email identity against the snapshot captured when the preview began. The
//! snapshot is deliberately not refreshed mid-preview; staleness relative to
//! the live roster is caught later by the applier's generation check.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Employee, EmployeeDraft, RowStatus};
use crate::store::RosterStore;

/// A point-in-time view of the roster, indexed by lowercased email.
pub struct RosterSnapshot {
    records: Arc<Vec<Employee>>,
    by_email: HashMap<String, usize>,
    generation: u64,
}

impl RosterSnapshot {
    /// Capture the store's current records and generation as one consistent
    /// pair.
    pub fn capture(store: &RosterStore) -> Self {
        let (records, generation) = store.snapshot();
        let by_email = records
            .iter()
            .enumerate()
            .map(|(i, emp)| (emp.email_key(), i))
            .collect();
        Self {
            records,
            by_email,
            generation,
        }
    }

    /// Look up an existing record by case-insensitive email equality.
    pub fn find_by_email(&self, email: &str) -> Option<&Employee> {
        let key = email.trim().to_lowercase();
        self.by_email.get(&key).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &Arc<Vec<Employee>> {
        &self.records
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Classify a validated draft: `update` when a snapshot record shares its
/// email, else `new`.
pub fn resolve_status(snapshot: &RosterSnapshot, draft: &EmployeeDraft) -> RowStatus {
    match draft.email.as_deref() {
        Some(email) if snapshot.find_by_email(email).is_some() => RowStatus::Update,
        _ => RowStatus::New,
    }
}
