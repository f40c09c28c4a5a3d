//! Store Module
//!
//! The keyed record store, the only shared mutable state in the process.
//!
//! ## Responsibilities
//! - Map `(namespace, digest)` to a record's bins
//! - Stay structurally sound under concurrent access from many connections
//!
//! The store itself gives no multi-step atomicity: the engine serializes
//! requests on the same key around its get → validate → put sequence.

mod memory;

use std::collections::BTreeMap;

use crate::protocol::{Key, Value};

pub use memory::MemoryStore;

/// A record's bins by name
pub type Record = BTreeMap<String, Value>;

/// Storage backend used by the engine
pub trait RecordStore: Send + Sync {
    /// Snapshot of the record stored under `key`
    fn get(&self, key: &Key) -> Option<Record>;

    /// Insert or fully replace the record under `key`
    fn put(&self, key: Key, record: Record);

    /// Remove the record, returning whether it existed
    fn remove(&self, key: &Key) -> bool;

    fn contains(&self, key: &Key) -> bool;
}
