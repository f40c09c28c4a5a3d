//! Per-key request serialization
//!
//! A fixed set of mutex stripes. Requests on the same key always land on the
//! same stripe; unrelated keys collide only by hash.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, MutexGuard};

use crate::protocol::Key;

pub(crate) struct KeyLocks {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLocks {
    pub(crate) fn new(count: usize) -> Self {
        let stripes = (0..count.max(1)).map(|_| Mutex::new(())).collect();
        Self { stripes }
    }

    /// Hold the stripe owning `key` until the guard drops
    pub(crate) fn lock(&self, key: &Key) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.stripes.len() as u64) as usize;
        self.stripes[index].lock()
    }
}
