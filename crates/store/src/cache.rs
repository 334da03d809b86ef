//! In-memory write-through cache.
//!
//! A shared concurrent string→string map. Readers and writers proceed in
//! parallel under the `RwLock`; every operation is linearizable per key,
//! so a key written through the router is readable here the moment the
//! write call returns. The cache is unbounded; eviction is a policy of
//! the tier above, not of the map.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Thread-safe key→value map shared by all router instances.
#[derive(Debug, Default)]
pub struct Cache {
    map: RwLock<HashMap<String, String>>,
}

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites one entry.
    pub fn write(&self, key: &str, value: &str) {
        self.map.write().insert(key.to_string(), value.to_string());
    }

    /// Inserts a whole batch under one lock acquisition.
    pub fn write_batch(&self, entries: &[(String, String)]) {
        let mut map = self.map.write();
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
    }

    /// Returns the cached value, if any.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}
