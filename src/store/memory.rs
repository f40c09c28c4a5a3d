//! In-memory record store
//!
//! HashMap-based store with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Record, RecordStore};
use crate::protocol::Key;

/// Process-lifetime record store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Key, Record>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &Key) -> Option<Record> {
        self.records.read().get(key).cloned()
    }

    fn put(&self, key: Key, record: Record) {
        self.records.write().insert(key, record);
    }

    fn remove(&self, key: &Key) -> bool {
        self.records.write().remove(key).is_some()
    }

    fn contains(&self, key: &Key) -> bool {
        self.records.read().contains_key(key)
    }
}
