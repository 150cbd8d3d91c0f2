use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel feeding live subscribers. A receiver
/// that falls further behind than this sees a `Lagged` error and skips
/// ahead; slow stream clients are not a back-pressure concern here.
const CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// ResultEntry
// ---------------------------------------------------------------------------

/// One accepted inbound callback. Immutable after insertion; evicted only
/// when the buffer exceeds its retention cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub id: String,
    pub received_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    /// The raw payload as received, before any normalization.
    pub payload: Value,
}

// ---------------------------------------------------------------------------
// ResultStore
// ---------------------------------------------------------------------------

/// Process-wide ordered buffer of accepted entries plus live pub/sub.
///
/// The sequence is newest-first and capped; insertion goes to the front and
/// eviction trims the tail. The mutex makes `add_result` atomic relative to
/// snapshots and subscriptions, and the broadcast send happens under the
/// lock so notification order always matches insertion order.
///
/// Exactly one store should exist per process: construct it once at startup
/// and share it via `Arc` through handler state.
pub struct ResultStore {
    cap: usize,
    inner: Mutex<VecDeque<ResultEntry>>,
    tx: broadcast::Sender<ResultEntry>,
}

impl ResultStore {
    pub fn new(cap: usize) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY.max(cap));
        Self {
            cap,
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            tx,
        }
    }

    /// Accept a payload: assign a fresh id and timestamp, insert at the
    /// front, evict beyond the cap, notify subscribers, return the entry.
    pub fn add_result(&self, payload: Value, source_ip: Option<String>) -> ResultEntry {
        let entry = ResultEntry {
            id: uuid::Uuid::new_v4().to_string(),
            received_at: Utc::now(),
            source_ip,
            payload,
        };

        let mut results = self.inner.lock().expect("result store lock poisoned");
        results.push_front(entry.clone());
        results.truncate(self.cap);
        // No receivers is fine; send only fails when nobody is listening.
        let _ = self.tx.send(entry.clone());
        entry
    }

    /// Point-in-time snapshot, newest-first.
    pub fn results(&self) -> Vec<ResultEntry> {
        let results = self.inner.lock().expect("result store lock poisoned");
        results.iter().cloned().collect()
    }

    /// Live feed of entries added from this call on. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ResultEntry> {
        self.tx.subscribe()
    }

    /// Snapshot and subscription taken under a single lock acquisition, so
    /// an entry added concurrently lands in exactly one of the two: either
    /// it is already in the snapshot or it will arrive on the receiver.
    pub fn watch(&self) -> (Vec<ResultEntry>, broadcast::Receiver<ResultEntry>) {
        let results = self.inner.lock().expect("result store lock poisoned");
        let snapshot = results.iter().cloned().collect();
        (snapshot, self.tx.subscribe())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_result_assigns_unique_ids() {
        let store = ResultStore::new(5);
        let a = store.add_result(json!({"n": 1}), None);
        let b = store.add_result(json!({"n": 2}), None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn results_are_newest_first() {
        let store = ResultStore::new(5);
        store.add_result(json!({"n": 1}), None);
        store.add_result(json!({"n": 2}), None);
        let results = store.results();
        assert_eq!(results[0].payload, json!({"n": 2}));
        assert_eq!(results[1].payload, json!({"n": 1}));
    }

    #[test]
    fn cap_evicts_oldest_entries() {
        let store = ResultStore::new(3);
        for n in 0..7 {
            store.add_result(json!({ "n": n }), None);
        }
        let results = store.results();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].payload, json!({"n": 6}));
        assert_eq!(results[2].payload, json!({"n": 4}));
    }

    #[test]
    fn timestamps_are_non_decreasing() {
        let store = ResultStore::new(5);
        let a = store.add_result(json!(1), None);
        let b = store.add_result(json!(2), None);
        assert!(b.received_at >= a.received_at);
    }

    #[tokio::test]
    async fn subscriber_receives_entries_in_insertion_order() {
        let store = ResultStore::new(10);
        let mut rx = store.subscribe();
        let a = store.add_result(json!({"n": 1}), None);
        let b = store.add_result(json!({"n": 2}), None);
        let c = store.add_result(json!({"n": 3}), None);
        assert_eq!(rx.recv().await.unwrap().id, a.id);
        assert_eq!(rx.recv().await.unwrap().id, b.id);
        assert_eq!(rx.recv().await.unwrap().id, c.id);
    }

    #[tokio::test]
    async fn late_subscriber_only_sees_later_entries() {
        let store = ResultStore::new(10);
        store.add_result(json!({"n": 1}), None);
        let mut rx = store.subscribe();
        let b = store.add_result(json!({"n": 2}), None);
        assert_eq!(rx.recv().await.unwrap().id, b.id);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_delivery_without_breaking_others() {
        let store = ResultStore::new(10);
        let rx_dropped = store.subscribe();
        let mut rx_kept = store.subscribe();
        drop(rx_dropped);
        let a = store.add_result(json!({"n": 1}), None);
        assert_eq!(rx_kept.recv().await.unwrap().id, a.id);
    }

    #[tokio::test]
    async fn watch_splits_entries_between_snapshot_and_live_exactly_once() {
        let store = ResultStore::new(10);
        let before = store.add_result(json!({"n": 1}), None);
        let (snapshot, mut rx) = store.watch();
        let after = store.add_result(json!({"n": 2}), None);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, before.id);
        assert_eq!(rx.recv().await.unwrap().id, after.id);
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn entry_serializes_with_camel_case_keys() {
        let store = ResultStore::new(1);
        let entry = store.add_result(json!({"x": 1}), Some("10.0.0.1".into()));
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("receivedAt").is_some());
        assert_eq!(value.get("sourceIp").unwrap(), "10.0.0.1");
    }

    #[test]
    fn absent_source_ip_is_omitted_from_serialization() {
        let store = ResultStore::new(1);
        let entry = store.add_result(json!({}), None);
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value.get("sourceIp").is_none());
    }
}
