use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use log::debug;
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use super::models::Candidate;
use super::{Result, StoreError};

type Listener = Box<dyn Fn(&Candidate) + Send + Sync>;
type ListenerMap = Mutex<HashMap<u64, Listener>>;

/// In-memory candidate record store. Single source of truth for candidate,
/// question and message data; every mutation goes through [`update`], which
/// applies a reducer under the write lock so no partial write is observable.
///
/// [`update`]: CandidateStore::update
pub struct CandidateStore {
    candidates: RwLock<HashMap<Uuid, Candidate>>,
    listeners: Arc<ListenerMap>,
    next_listener_id: AtomicU64,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self {
            candidates: RwLock::new(HashMap::new()),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    pub fn get(&self, id: &Uuid) -> Result<Candidate> {
        self.candidates
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::CandidateNotFound(id.to_string()))
    }

    /// All candidates, newest first.
    pub fn list(&self) -> Vec<Candidate> {
        let mut all: Vec<Candidate> = self.candidates.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Inserts a new candidate or replaces an existing record wholesale.
    pub fn upsert(&self, candidate: Candidate) {
        let snapshot = candidate.clone();
        self.candidates.write().insert(candidate.id, candidate);
        self.notify(&snapshot);
    }

    /// Applies `reducer` to the candidate under the write lock and notifies
    /// subscribers with the resulting record.
    pub fn update<F>(&self, id: &Uuid, reducer: F) -> Result<Candidate>
    where
        F: FnOnce(&mut Candidate),
    {
        let snapshot = {
            let mut candidates = self.candidates.write();
            let candidate = candidates
                .get_mut(id)
                .ok_or_else(|| StoreError::CandidateNotFound(id.to_string()))?;
            reducer(candidate);
            candidate.clone()
        };
        self.notify(&snapshot);
        Ok(snapshot)
    }

    /// Registers a listener invoked after every committed mutation. The
    /// returned handle unsubscribes when dropped.
    pub fn subscribe<F>(&self, listener: F) -> StoreSubscription
    where
        F: Fn(&Candidate) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, Box::new(listener));
        debug!("Store listener {} registered", id);
        StoreSubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn notify(&self, candidate: &Candidate) {
        for listener in self.listeners.lock().values() {
            listener(candidate);
        }
    }
}

impl Default for CandidateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribes its listener on drop.
pub struct StoreSubscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl StoreSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().remove(&self.id);
            debug!("Store listener {} removed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::super::models::CandidateStatus;
    use super::*;

    #[test]
    fn get_after_upsert_round_trips() {
        let store = CandidateStore::new();
        let candidate = Candidate::new("resume text");
        let id = candidate.id;
        store.upsert(candidate);
        let loaded = store.get(&id).unwrap();
        assert_eq!(loaded.resume_text, "resume text");
        assert_eq!(loaded.status, CandidateStatus::InfoCollection);
    }

    #[test]
    fn get_unknown_candidate_fails() {
        let store = CandidateStore::new();
        assert!(matches!(
            store.get(&Uuid::new_v4()),
            Err(StoreError::CandidateNotFound(_))
        ));
    }

    #[test]
    fn update_applies_reducer_atomically() {
        let store = CandidateStore::new();
        let candidate = Candidate::new("");
        let id = candidate.id;
        store.upsert(candidate);

        let updated = store
            .update(&id, |c| {
                c.name = "Ada Lovelace".to_string();
                c.status = CandidateStatus::InProgress;
            })
            .unwrap();
        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(store.get(&id).unwrap().status, CandidateStatus::InProgress);
    }

    #[test]
    fn subscribers_see_each_commit_until_dropped() {
        let store = CandidateStore::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let sub = store.subscribe(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        let candidate = Candidate::new("");
        let id = candidate.id;
        store.upsert(candidate);
        store.update(&id, |c| c.name = "x".to_string()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        drop(sub);
        store.update(&id, |c| c.name = "y".to_string()).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn list_orders_newest_first() {
        let store = CandidateStore::new();
        let mut older = Candidate::new("a");
        older.created_at = older.created_at - chrono::Duration::seconds(10);
        let newer = Candidate::new("b");
        let newer_id = newer.id;
        store.upsert(older);
        store.upsert(newer);
        assert_eq!(store.list()[0].id, newer_id);
    }
}
