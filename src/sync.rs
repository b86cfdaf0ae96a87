//! Best-effort mirroring of session state to other observer contexts in the
//! same process. Broadcasts are hints that a fresher read of the candidate
//! record store is available - never a source of truth. There is no replay
//! for late subscribers, no cross-event ordering, and no acknowledgment;
//! consumers must re-read the authoritative store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde::{Serialize, Deserialize};
use serde_json::Value;
use uuid::Uuid;

use crate::interview::TimerState;
use crate::store::Message;

pub const CANDIDATE_UPDATE: &str = "CANDIDATE_UPDATE";
pub const INTERVIEW_STATE: &str = "INTERVIEW_STATE";
pub const NEW_MESSAGE: &str = "NEW_MESSAGE";

/// Envelope delivered to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMessage {
    pub event: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

type SyncListener = Box<dyn Fn(&SyncMessage) + Send + Sync>;
type SyncListenerMap = Mutex<HashMap<u64, SyncListener>>;

pub struct TabSync {
    listeners: Arc<SyncListenerMap>,
    next_id: AtomicU64,
}

// Process-wide channel shared by all surfaces of the application.
lazy_static! {
    static ref GLOBAL_CHANNEL: Arc<TabSync> = Arc::new(TabSync::new());
}

impl TabSync {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn global() -> Arc<TabSync> {
        GLOBAL_CHANNEL.clone()
    }

    /// Fire-and-forget delivery to whoever is currently subscribed.
    pub fn broadcast(&self, event: &str, payload: Value) {
        let message = SyncMessage {
            event: event.to_string(),
            payload,
            timestamp: Utc::now(),
        };
        for listener in self.listeners.lock().values() {
            listener(&message);
        }
    }

    /// Registers a listener; the handle unsubscribes on drop.
    pub fn subscribe<F>(&self, callback: F) -> SyncSubscription
    where
        F: Fn(&SyncMessage) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, Box::new(callback));
        SyncSubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn candidate_update(&self, candidate_id: &Uuid) {
        self.broadcast(
            CANDIDATE_UPDATE,
            serde_json::json!({ "candidateId": candidate_id }),
        );
    }

    pub fn interview_state(&self, state: &TimerState) {
        let payload = serde_json::to_value(state).unwrap_or(Value::Null);
        self.broadcast(INTERVIEW_STATE, payload);
    }

    pub fn new_message(&self, candidate_id: &Uuid, message: &Message) {
        let payload = serde_json::json!({
            "candidateId": candidate_id,
            "message": message,
        });
        self.broadcast(NEW_MESSAGE, payload);
    }
}

impl Default for TabSync {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SyncSubscription {
    id: u64,
    listeners: Weak<SyncListenerMap>,
}

impl SyncSubscription {
    pub fn unsubscribe(self) {}
}

impl Drop for SyncSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn broadcast_reaches_current_subscribers_only() {
        let sync = TabSync::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        let sub = sync.subscribe(move |msg| {
            assert_eq!(msg.event, CANDIDATE_UPDATE);
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        sync.candidate_update(&Uuid::new_v4());
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        drop(sub);
        // No replay, no delivery to dropped subscribers.
        sync.candidate_update(&Uuid::new_v4());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn payload_carries_the_event_shape() {
        let sync = TabSync::new();
        let captured: Arc<Mutex<Vec<SyncMessage>>> = Arc::new(Mutex::new(Vec::new()));

        let captured_clone = captured.clone();
        let _sub = sync.subscribe(move |msg| captured_clone.lock().push(msg.clone()));

        let candidate_id = Uuid::new_v4();
        let message = Message::assistant("hello");
        sync.new_message(&candidate_id, &message);

        let captured = captured.lock();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].event, NEW_MESSAGE);
        assert_eq!(
            captured[0].payload["candidateId"],
            serde_json::json!(candidate_id)
        );
        assert_eq!(captured[0].payload["message"]["content"], "hello");
    }
}
