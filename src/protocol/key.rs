//! Record keys

use std::hash::{Hash, Hasher};

use super::Value;

/// Length of a record digest
pub const DIGEST_SIZE: usize = 20;

/// Client-computed record digest, used verbatim
pub type Digest = [u8; DIGEST_SIZE];

/// Identifies a record.
///
/// Identity is `(namespace, digest)`. The set name and user key are carried
/// for echo-back only: two keys that differ only in set or user key address
/// the same record.
#[derive(Debug, Clone)]
pub struct Key {
    pub namespace: String,
    pub set: Option<String>,
    pub digest: Digest,
    pub user_key: Option<Value>,
}

impl Key {
    pub fn new(namespace: impl Into<String>, digest: Digest) -> Self {
        Self {
            namespace: namespace.into(),
            set: None,
            digest,
            user_key: None,
        }
    }

    pub fn with_set(mut self, set: impl Into<String>) -> Self {
        self.set = Some(set.into());
        self
    }

    pub fn with_user_key(mut self, user_key: impl Into<Value>) -> Self {
        self.user_key = Some(user_key.into());
        self
    }

    /// Digest as lowercase hex, for logging
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.digest == other.digest
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.digest.hash(state);
    }
}
