//! Request router.
//!
//! Stateless dispatcher over the two tiers. A PUT fans the batch out to
//! the cache and the persistence actor and acknowledges only after both
//! have accepted it; a GET reads the cache first and falls back to
//! persistence per key, preserving input order in the response.
//!
//! Partial failure is allowed by design: if the persistence tier rejects
//! a batch after the cache took it, the caller sees an error and neither
//! tier is rolled back; the next successful PUT re-aligns them.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::persist::PersistenceHandle;

/// One key with its value fragments, as sent by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutEntry {
    pub key: String,
    /// Fragments are joined with `","` into the stored value.
    pub value: Vec<String>,
}

/// Body of a PUT request: `{"newKeys":[{"key":"k","value":["a","b"]}]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    #[serde(rename = "newKeys")]
    pub new_keys: Vec<PutEntry>,
}

/// Body of a GET request: `{"keys":["k1","k2"]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    pub keys: Vec<String>,
}

/// Body of a GET response: one value array per requested key, in request
/// order. NOT_FOUND is an empty array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: Vec<Vec<String>>,
}

/// Stateless request dispatcher. Cloning shares the underlying handles,
/// so every router worker holds its own copy.
#[derive(Clone)]
pub struct Router {
    cache: Arc<Cache>,
    persist: PersistenceHandle,
}

impl Router {
    #[must_use]
    pub fn new(cache: Arc<Cache>, persist: PersistenceHandle) -> Self {
        Self { cache, persist }
    }

    /// Applies a PUT batch to both tiers. Returns once the cache holds
    /// the entries and the persistence actor has written them.
    pub fn put(&self, request: PutRequest) -> Result<()> {
        let entries: Vec<(String, String)> = request
            .new_keys
            .into_iter()
            .map(|e| (e.key, e.value.join(",")))
            .collect();

        self.cache.write_batch(&entries);
        self.persist
            .put(entries)
            .context("persistence tier rejected the batch")?;
        Ok(())
    }

    /// Resolves each requested key, cache first, preserving input order.
    pub fn get(&self, request: &GetRequest) -> Result<GetResponse> {
        let mut value = Vec::with_capacity(request.keys.len());
        for key in &request.keys {
            let found = match self.cache.read(key) {
                Some(v) => Some(v),
                None => self
                    .persist
                    .get(key)
                    .with_context(|| format!("persistence lookup for {key:?} failed"))?,
            };
            value.push(match found {
                Some(v) => split_value(&v),
                None => Vec::new(),
            });
        }
        Ok(GetResponse { value })
    }
}

/// Splits a stored value back into the fragments it was joined from.
fn split_value(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}
