//! Import application: merge accepted preview rows into the roster.
//!
//! The applier builds the whole new roster first and commits it as one
//! atomic replacement, so either the full batch of non-error rows lands or
//! nothing does. A preview whose snapshot generation no longer matches the
//! store is rejected with [`ImportError::StaleSnapshot`] instead of
//! silently overwriting concurrent changes.

use std::collections::HashMap;

use uuid::Uuid;

use crate::api::logs::{log_success, log_warning};
use crate::error::{ImportError, ImportResult};
use crate::models::{
    Employee, EmployeeDraft, EmployeeStatus, ImportPreview, Role, RowStatus, UNASSIGNED_TEAM,
};
use crate::store::RosterStore;

/// Counts reported after a committed apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Roster generation produced by the commit.
    pub generation: u64,
}

/// Apply a preview to the store.
///
/// Error rows are skipped. Update rows partial-merge into the matched
/// record: defined draft fields overwrite, undefined fields retain their
/// prior value, and `id`/`status` are never touched. New rows get a
/// synthesized identity and default to `Invited`; a blank team becomes the
/// [`UNASSIGNED_TEAM`] placeholder when auto-create was enabled.
pub fn apply(preview: &ImportPreview, store: &RosterStore) -> ImportResult<ApplyOutcome> {
    let (records, generation) = store.snapshot();
    if generation != preview.snapshot_generation {
        log_warning(format!(
            "Apply rejected: roster moved from generation {} to {}",
            preview.snapshot_generation, generation
        ));
        return Err(ImportError::StaleSnapshot {
            expected: preview.snapshot_generation,
            found: generation,
        });
    }

    let mut roster: Vec<Employee> = records.as_ref().clone();
    let mut by_email: HashMap<String, usize> = roster
        .iter()
        .enumerate()
        .map(|(i, emp)| (emp.email_key(), i))
        .collect();

    let mut created = 0;
    let mut updated = 0;
    let mut skipped = 0;

    for row in &preview.rows {
        if row.status == RowStatus::Error {
            skipped += 1;
            continue;
        }

        // Email presence is guaranteed by validation for non-error rows.
        let key = match row.draft.email_key() {
            Some(key) => key,
            None => {
                skipped += 1;
                continue;
            }
        };

        match by_email.get(&key) {
            Some(&i) => {
                // Covers `update` rows, and `new` rows whose email already
                // landed earlier in this same batch; merging keeps the
                // case-insensitive uniqueness invariant.
                merge_into(&mut roster[i], &row.draft);
                updated += 1;
            }
            None => {
                let employee = synthesize(&row.draft, preview.auto_create_team);
                by_email.insert(key, roster.len());
                roster.push(employee);
                created += 1;
            }
        }
    }

    let generation = store
        .commit_if_current(preview.snapshot_generation, roster)
        .map_err(|found| ImportError::StaleSnapshot {
            expected: preview.snapshot_generation,
            found,
        })?;

    log_success(format!(
        "Import applied: {} created, {} updated, {} skipped",
        created, updated, skipped
    ));

    Ok(ApplyOutcome {
        created,
        updated,
        skipped,
        generation,
    })
}

/// Partial merge: every defined draft field overwrites the matched record's
/// field; undefined fields keep their prior value. Drafts cannot carry `id`
/// or `status`, so both are preserved.
fn merge_into(existing: &mut Employee, draft: &EmployeeDraft) {
    if let Some(v) = &draft.email {
        existing.email = v.clone();
    }
    if let Some(v) = &draft.first_name {
        existing.first_name = v.clone();
    }
    if let Some(v) = &draft.last_name {
        existing.last_name = v.clone();
    }
    if let Some(v) = &draft.phone {
        existing.phone = Some(v.clone());
    }
    if let Some(v) = &draft.position {
        existing.position = Some(v.clone());
    }
    if let Some(v) = &draft.team {
        existing.team = v.clone();
    }
    if let Some(v) = draft.role {
        existing.role = v;
    }
    if let Some(v) = &draft.locale {
        existing.locale = Some(v.clone());
    }
    if let Some(v) = &draft.timezone {
        existing.timezone = Some(v.clone());
    }
    if let Some(v) = &draft.employment_type {
        existing.employment_type = Some(v.clone());
    }
}

/// Build a brand-new record from a validated draft.
fn synthesize(draft: &EmployeeDraft, auto_create_team: bool) -> Employee {
    let team = match draft.team.clone() {
        Some(team) if !team.trim().is_empty() => team,
        // Validation guarantees a blank team only passes with auto-create.
        _ if auto_create_team => UNASSIGNED_TEAM.to_string(),
        _ => String::new(),
    };

    Employee {
        id: Uuid::new_v4(),
        email: draft.email.clone().unwrap_or_default(),
        first_name: draft.first_name.clone().unwrap_or_default(),
        last_name: draft.last_name.clone().unwrap_or_default(),
        phone: draft.phone.clone(),
        position: draft.position.clone(),
        team,
        role: draft.role.unwrap_or(Role::Employee),
        status: EmployeeStatus::Invited,
        locale: draft.locale.clone(),
        timezone: draft.timezone.clone(),
        employment_type: draft.employment_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::pipeline::preview_text;

    fn employee(email: &str, team: &str, phone: Option<&str>) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: "Existing".into(),
            last_name: "User".into(),
            phone: phone.map(String::from),
            position: None,
            team: team.into(),
            role: Role::Employee,
            status: EmployeeStatus::Active,
            locale: None,
            timezone: None,
            employment_type: None,
        }
    }

    #[test]
    fn test_apply_grows_roster_by_new_rows_only() {
        let store = RosterStore::with_records(vec![
            employee("ana@acme.com", "Product", None),
            employee("zoe@acme.com", "Sales", None),
        ]);
        // 2 new, 1 update, 1 error
        let csv = "email,team,phone\n\
                   bob@acme.com,Sales,\n\
                   ana@acme.com,Design,\n\
                   carol@acme.com,Ops,\n\
                   dave@acme.com,Ops,12345";

        let preview = preview_text(csv, &store, false);
        let outcome = apply(&preview, &store).unwrap();

        assert_eq!(outcome.created, 2);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.skipped, 1);

        let roster = store.read();
        assert_eq!(roster.len(), 4);

        // Non-targeted record unchanged.
        let zoe = roster.iter().find(|e| e.email == "zoe@acme.com").unwrap();
        assert_eq!(zoe.team, "Sales");
        assert_eq!(zoe.status, EmployeeStatus::Active);
    }

    #[test]
    fn test_partial_merge_retains_undefined_fields() {
        let existing = employee("ana@acme.com", "Product", Some("+34600111222"));
        let original_id = existing.id;
        let store = RosterStore::with_records(vec![existing]);

        // Team provided, phone and names absent.
        let csv = "email,team\nana@acme.com,Design";
        let preview = preview_text(csv, &store, false);
        apply(&preview, &store).unwrap();

        let roster = store.read();
        let ana = &roster[0];
        assert_eq!(ana.id, original_id);
        assert_eq!(ana.team, "Design");
        assert_eq!(ana.phone.as_deref(), Some("+34600111222"));
        assert_eq!(ana.first_name, "Existing");
        // Status preserved: the update must not reset an Active record.
        assert_eq!(ana.status, EmployeeStatus::Active);
    }

    #[test]
    fn test_new_row_defaults() {
        let store = RosterStore::new();
        let csv = "first_name,last_name,email,phone,position,team,role\n\
                   Ana,Gomez,ana@acme.com,+34600111222,Designer,Product,employee";

        let preview = preview_text(csv, &store, false);
        let outcome = apply(&preview, &store).unwrap();
        assert_eq!(outcome.created, 1);

        let roster = store.read();
        let ana = &roster[0];
        assert_eq!(ana.status, EmployeeStatus::Invited);
        assert_eq!(ana.first_name, "Ana");
        assert_eq!(ana.position.as_deref(), Some("Designer"));
    }

    #[test]
    fn test_blank_team_gets_placeholder_with_auto_create() {
        let store = RosterStore::new();
        let csv = "email\nana@acme.com";

        let preview = preview_text(csv, &store, true);
        apply(&preview, &store).unwrap();

        assert_eq!(store.read()[0].team, UNASSIGNED_TEAM);
    }

    #[test]
    fn test_error_rows_excluded_from_result() {
        let store = RosterStore::new();
        let csv = "email,team,phone\nana@acme.com,Product,12345";

        let preview = preview_text(csv, &store, false);
        let outcome = apply(&preview, &store).unwrap();

        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.skipped, 1);
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_stale_preview_rejected() {
        let store = RosterStore::new();
        let csv = "email,team\nana@acme.com,Product";
        let preview = preview_text(csv, &store, false);

        // Roster moves on after the preview was taken.
        store.commit(vec![employee("late@acme.com", "Ops", None)]);

        let err = apply(&preview, &store).unwrap_err();
        assert!(matches!(
            err,
            ImportError::StaleSnapshot {
                expected: 0,
                found: 1
            }
        ));
        // Nothing from the stale preview was committed.
        assert_eq!(store.read().len(), 1);
    }

    #[test]
    fn test_duplicate_email_within_batch_merges() {
        let store = RosterStore::new();
        let csv = "email,team,position\n\
                   ana@acme.com,Product,\n\
                   ANA@acme.com,Design,Designer";

        let preview = preview_text(csv, &store, false);
        let outcome = apply(&preview, &store).unwrap();

        // One record, second row merged into the first.
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 1);
        let roster = store.read();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].team, "Design");
        assert_eq!(roster[0].position.as_deref(), Some("Designer"));
    }

    #[test]
    fn test_apply_bumps_generation() {
        let store = RosterStore::new();
        let preview = preview_text("email,team\nana@acme.com,Product", &store, false);
        let outcome = apply(&preview, &store).unwrap();
        assert_eq!(outcome.generation, 1);
        assert_eq!(store.generation(), 1);
    }
}
