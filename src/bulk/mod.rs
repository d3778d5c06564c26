//! Bulk actions over a caller-selected set of roster records.
//!
//! Every action reports one [`BulkOutcome`] per target: a failing target
//! never aborts or rolls back the others, and the batch is never collapsed
//! into a single all-or-nothing result.
//!
//! `archive` is a local, idempotent status transition committed as one
//! atomic roster swap. `resend_invite` and `assign_team` delegate to the
//! upstream API per target through the request executor.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::logs::{log_success, log_warning};
use crate::models::EmployeeStatus;
use crate::request::ApiClient;
use crate::store::RosterStore;

/// Per-target result of a bulk action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    pub id: Uuid,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkOutcome {
    fn ok(id: Uuid) -> Self {
        Self {
            id,
            success: true,
            error: None,
        }
    }

    fn failed(id: Uuid, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Archive the selected records.
///
/// Pure local transition to `Archived`, committed as one roster swap.
/// Re-archiving an already-archived record is a no-op, never an error;
/// an unknown id is reported on its own outcome only.
pub fn archive(store: &RosterStore, ids: &[Uuid]) -> Vec<BulkOutcome> {
    let (records, _) = store.snapshot();
    let mut roster = records.as_ref().clone();

    let wanted: HashSet<Uuid> = ids.iter().copied().collect();
    let mut found: HashSet<Uuid> = HashSet::new();

    for emp in roster.iter_mut() {
        if wanted.contains(&emp.id) {
            emp.status = EmployeeStatus::Archived;
            found.insert(emp.id);
        }
    }

    // No commit when nothing matched: a generation bump with no state
    // change would needlessly invalidate in-flight previews.
    if found.is_empty() {
        log_warning(format!("Archive matched none of {} requested ids", ids.len()));
    } else {
        store.commit(roster);
        log_success(format!("Archived {} of {} records", found.len(), ids.len()));
    }

    ids.iter()
        .map(|id| {
            if found.contains(id) {
                BulkOutcome::ok(*id)
            } else {
                BulkOutcome::failed(*id, "record not found")
            }
        })
        .collect()
}

/// Re-send the invitation email for each selected record via the upstream
/// API. Outcomes are tracked independently per target.
pub async fn resend_invite(client: &ApiClient, ids: &[Uuid]) -> Vec<BulkOutcome> {
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let result: Result<Value, _> = client
            .post(&format!("/api/employees/{}/resend-invite", id), json!({}))
            .await;
        outcomes.push(to_outcome(*id, result));
    }
    report("resend-invite", &outcomes);
    outcomes
}

/// Assign each selected record to `team` via the upstream API.
pub async fn assign_team(client: &ApiClient, ids: &[Uuid], team: &str) -> Vec<BulkOutcome> {
    let mut outcomes = Vec::with_capacity(ids.len());
    for id in ids {
        let result: Result<Value, _> = client
            .post(
                &format!("/api/employees/{}/team", id),
                json!({ "team": team }),
            )
            .await;
        outcomes.push(to_outcome(*id, result));
    }
    report("assign-team", &outcomes);
    outcomes
}

fn to_outcome(id: Uuid, result: Result<Value, crate::error::RequestError>) -> BulkOutcome {
    match result {
        Ok(_) => BulkOutcome::ok(id),
        Err(e) => BulkOutcome::failed(id, e.to_string()),
    }
}

fn report(action: &str, outcomes: &[BulkOutcome]) {
    let failures = outcomes.iter().filter(|o| !o.success).count();
    if failures > 0 {
        log_warning(format!(
            "{}: {} of {} targets failed",
            action,
            failures,
            outcomes.len()
        ));
    } else {
        log_success(format!("{}: all {} targets succeeded", action, outcomes.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, Role};
    use crate::request::RequestConfig;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::time::Duration;

    fn employee(email: &str, status: EmployeeStatus) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            phone: None,
            position: None,
            team: "Product".into(),
            role: Role::Employee,
            status,
            locale: None,
            timezone: None,
            employment_type: None,
        }
    }

    #[test]
    fn test_archive_transitions_status() {
        let emp = employee("ana@acme.com", EmployeeStatus::Active);
        let id = emp.id;
        let store = RosterStore::with_records(vec![emp]);

        let outcomes = archive(&store, &[id]);

        assert_eq!(outcomes, vec![BulkOutcome::ok(id)]);
        assert_eq!(store.read()[0].status, EmployeeStatus::Archived);
    }

    #[test]
    fn test_rearchive_is_noop() {
        let emp = employee("ana@acme.com", EmployeeStatus::Archived);
        let id = emp.id;
        let store = RosterStore::with_records(vec![emp]);

        let outcomes = archive(&store, &[id]);

        assert!(outcomes[0].success);
        assert_eq!(store.read()[0].status, EmployeeStatus::Archived);
    }

    #[test]
    fn test_archive_unknown_id_isolated() {
        let emp = employee("ana@acme.com", EmployeeStatus::Active);
        let known = emp.id;
        let unknown = Uuid::new_v4();
        let store = RosterStore::with_records(vec![emp]);

        let outcomes = archive(&store, &[known, unknown]);

        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(outcomes[1].error.as_deref(), Some("record not found"));
        // The known target was still archived.
        assert_eq!(store.read()[0].status, EmployeeStatus::Archived);
    }

    #[test]
    fn test_archive_without_matches_skips_commit() {
        let emp = employee("ana@acme.com", EmployeeStatus::Active);
        let store = RosterStore::with_records(vec![emp]);
        let before = store.generation();

        let outcomes = archive(&store, &[Uuid::new_v4(), Uuid::new_v4()]);

        assert!(outcomes.iter().all(|o| !o.success));
        // No state change, so no generation bump.
        assert_eq!(store.generation(), before);
        assert_eq!(store.read()[0].status, EmployeeStatus::Active);

        // Same for an empty id set.
        assert!(archive(&store, &[]).is_empty());
        assert_eq!(store.generation(), before);
    }

    #[test]
    fn test_archive_leaves_others_untouched() {
        let target = employee("ana@acme.com", EmployeeStatus::Active);
        let bystander = employee("bob@acme.com", EmployeeStatus::Invited);
        let target_id = target.id;
        let store = RosterStore::with_records(vec![target, bystander]);

        archive(&store, &[target_id]);

        let roster = store.read();
        let bob = roster.iter().find(|e| e.email == "bob@acme.com").unwrap();
        assert_eq!(bob.status, EmployeeStatus::Invited);
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_client(base: String) -> ApiClient {
        ApiClient::new(base).with_config(RequestConfig {
            attempt_timeout: Duration::from_secs(5),
            max_retries: 1,
            backoff_base: Duration::from_millis(5),
        })
    }

    #[tokio::test]
    async fn test_resend_invite_isolates_failures() {
        let good = Uuid::new_v4();
        let bad = Uuid::new_v4();
        let bad_for_handler = bad;

        let app = Router::new().route(
            "/api/employees/{id}/resend-invite",
            post(move |Path(id): Path<Uuid>| async move {
                if id == bad_for_handler {
                    (
                        StatusCode::NOT_FOUND,
                        Json(serde_json::json!({ "error": "no such employee" })),
                    )
                } else {
                    (StatusCode::OK, Json(serde_json::json!({ "sent": true })))
                }
            }),
        );
        let base = spawn_stub(app).await;
        let client = test_client(base);

        let outcomes = resend_invite(&client, &[good, bad]).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[1]
            .error
            .as_deref()
            .unwrap()
            .contains("no such employee"));
    }

    #[tokio::test]
    async fn test_assign_team_posts_team_per_target() {
        let id = Uuid::new_v4();
        let app = Router::new().route(
            "/api/employees/{id}/team",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["team"], "Platform");
                Json(serde_json::json!({ "ok": true }))
            }),
        );
        let base = spawn_stub(app).await;
        let client = test_client(base);

        let outcomes = assign_team(&client, &[id], "Platform").await;
        assert_eq!(outcomes, vec![BulkOutcome::ok(id)]);
    }
}
