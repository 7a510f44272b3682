//! Bounded, newest-first history of saved routes.

use crate::error::PersistenceError;
use crate::models::RouteRecord;
use std::collections::HashMap;

/// Storage key holding the serialized history list.
pub const HISTORY_KEY: &str = "routeHistory";

/// Persisted key-value storage. Reads and writes are atomic per key.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Volatile store, for tests and sessions without a history file.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct HistoryStore<K> {
    store: K,
    limit: usize,
    records: Vec<RouteRecord>,
}

impl<K: KeyValueStore> HistoryStore<K> {
    /// Open the history, starting empty if the stored list is missing or unreadable.
    pub fn open(store: K, limit: usize) -> Self {
        let records = match load_records(&store) {
            Ok(mut records) => {
                records.truncate(limit);
                records
            }
            Err(err) => {
                tracing::warn!("Route history unreadable, starting empty: {}", err);
                Vec::new()
            }
        };
        tracing::debug!("Loaded {} saved routes", records.len());
        Self {
            store,
            limit,
            records,
        }
    }

    /// Saved routes, newest first.
    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&RouteRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prepend a route, evicting the oldest beyond the limit.
    ///
    /// A failed write is logged and leaves the history unchanged.
    pub fn save(&mut self, record: RouteRecord) -> bool {
        let mut next = Vec::with_capacity(self.records.len() + 1);
        next.push(record);
        next.extend(self.records.iter().cloned());
        next.truncate(self.limit);
        self.commit(next)
    }

    pub fn clear(&mut self) -> bool {
        self.commit(Vec::new())
    }

    fn commit(&mut self, next: Vec<RouteRecord>) -> bool {
        let result = serde_json::to_string(&next)
            .map_err(PersistenceError::from)
            .and_then(|encoded| self.store.write(HISTORY_KEY, &encoded));
        match result {
            Ok(()) => {
                self.records = next;
                true
            }
            Err(err) => {
                tracing::error!("Failed to persist route history: {}", err);
                false
            }
        }
    }
}

fn load_records<K: KeyValueStore>(store: &K) -> Result<Vec<RouteRecord>, PersistenceError> {
    match store.read(HISTORY_KEY)? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PathPoint, Place};

    fn record(n: usize) -> RouteRecord {
        RouteRecord::new(
            Place::new(0.0, n as f64 * 0.001, format!("start-{n}")),
            &[],
            Place::new(1.0, 1.0, "end"),
            vec![PathPoint::new(0.0, 0.0), PathPoint::new(1.0, 1.0)],
            n as f64,
        )
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
            Err(std::io::Error::other("disk gone").into())
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
            Err(std::io::Error::other("disk gone").into())
        }
    }

    #[test]
    fn hundred_and_first_save_evicts_oldest() {
        let mut history = HistoryStore::open(MemoryStore::new(), 100);
        for n in 0..101 {
            assert!(history.save(record(n)));
        }
        assert_eq!(history.len(), 100);
        assert_eq!(history.records()[0].start.name, "start-100");
        assert_eq!(history.records()[99].start.name, "start-1");
    }

    #[test]
    fn history_survives_reopen() {
        let mut history = HistoryStore::open(MemoryStore::new(), 100);
        history.save(record(1));
        history.save(record(2));

        let reopened = HistoryStore::open(history.store.clone(), 100);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.records()[0].start.name, "start-2");
    }

    #[test]
    fn corrupt_payload_starts_empty() {
        let mut store = MemoryStore::new();
        store.write(HISTORY_KEY, "{not json").unwrap();
        let history = HistoryStore::open(store, 100);
        assert!(history.is_empty());
    }

    #[test]
    fn failed_write_is_a_no_op() {
        let mut history = HistoryStore::open(BrokenStore, 100);
        assert!(history.is_empty());
        assert!(!history.save(record(1)));
        assert!(history.is_empty());
    }

    #[test]
    fn clear_empties_the_list() {
        let mut history = HistoryStore::open(MemoryStore::new(), 100);
        history.save(record(1));
        assert!(history.clear());
        assert!(history.is_empty());
        assert_eq!(
            history.store.read(HISTORY_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }
}
