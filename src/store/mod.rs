//! In-memory roster store with generation tracking.
//!
//! [`RosterStore`] is the single explicit owner of the employee collection.
//! All mutation flows through the import applier and the bulk executor;
//! every other component only reads point-in-time snapshots.
//!
//! A commit replaces the collection reference as one atomic swap and bumps
//! a generation counter, so a reader can never observe a partially-applied
//! import and an in-flight apply whose snapshot went stale can be detected
//! and rejected. Change events are broadcast to subscribers the same way
//! the log stream is.

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use crate::models::Employee;

/// Event emitted after each committed roster replacement.
#[derive(Debug, Clone)]
pub struct RosterEvent {
    /// Generation the commit produced.
    pub generation: u64,
    /// Roster size after the commit.
    pub size: usize,
}

struct Inner {
    records: Arc<Vec<Employee>>,
    generation: u64,
}

/// Exclusive owner of the employee record collection.
pub struct RosterStore {
    inner: RwLock<Inner>,
    events: broadcast::Sender<RosterEvent>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed the store with an initial roster at generation 0.
    pub fn with_records(records: Vec<Employee>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: RwLock::new(Inner {
                records: Arc::new(records),
                generation: 0,
            }),
            events,
        }
    }

    /// Point-in-time snapshot of the roster. Cheap: clones the `Arc`, not
    /// the records.
    pub fn read(&self) -> Arc<Vec<Employee>> {
        self.inner.read().expect("roster lock poisoned").records.clone()
    }

    /// Snapshot together with the generation it belongs to, taken under one
    /// lock so the pair is always consistent.
    pub fn snapshot(&self) -> (Arc<Vec<Employee>>, u64) {
        let inner = self.inner.read().expect("roster lock poisoned");
        (inner.records.clone(), inner.generation)
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().expect("roster lock poisoned").generation
    }

    /// Replace the roster unconditionally. Returns the new generation.
    pub fn commit(&self, roster: Vec<Employee>) -> u64 {
        let mut inner = self.inner.write().expect("roster lock poisoned");
        inner.records = Arc::new(roster);
        inner.generation += 1;
        self.notify(&inner);
        inner.generation
    }

    /// Replace the roster only if the caller's snapshot generation is still
    /// current. On mismatch nothing is committed and the live generation is
    /// returned as the error, letting the caller surface a stale-snapshot
    /// conflict instead of silently overwriting.
    pub fn commit_if_current(&self, expected: u64, roster: Vec<Employee>) -> Result<u64, u64> {
        let mut inner = self.inner.write().expect("roster lock poisoned");
        if inner.generation != expected {
            return Err(inner.generation);
        }
        inner.records = Arc::new(roster);
        inner.generation += 1;
        self.notify(&inner);
        Ok(inner.generation)
    }

    /// Subscribe to roster change events.
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    fn notify(&self, inner: &Inner) {
        // Ignore if no receivers
        let _ = self.events.send(RosterEvent {
            generation: inner.generation,
            size: inner.records.len(),
        });
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeStatus, Role};
    use uuid::Uuid;

    fn employee(email: &str) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            email: email.into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            phone: None,
            position: None,
            team: "Product".into(),
            role: Role::Employee,
            status: EmployeeStatus::Active,
            locale: None,
            timezone: None,
            employment_type: None,
        }
    }

    #[test]
    fn test_commit_bumps_generation() {
        let store = RosterStore::new();
        assert_eq!(store.generation(), 0);

        let gen = store.commit(vec![employee("a@x.io")]);
        assert_eq!(gen, 1);
        assert_eq!(store.read().len(), 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_commits() {
        let store = RosterStore::new();
        store.commit(vec![employee("a@x.io")]);

        let (snapshot, gen) = store.snapshot();
        store.commit(vec![employee("a@x.io"), employee("b@x.io")]);

        // The earlier snapshot still sees one record.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(gen, 1);
        assert_eq!(store.read().len(), 2);
    }

    #[test]
    fn test_commit_if_current_rejects_stale() {
        let store = RosterStore::new();
        let (_, gen) = store.snapshot();

        store.commit(vec![employee("a@x.io")]);

        let result = store.commit_if_current(gen, vec![]);
        assert_eq!(result, Err(1));
        // Nothing was committed.
        assert_eq!(store.read().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_receives_commit_event() {
        let store = RosterStore::new();
        let mut rx = store.subscribe();

        store.commit(vec![employee("a@x.io")]);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.generation, 1);
        assert_eq!(event.size, 1);
    }
}
