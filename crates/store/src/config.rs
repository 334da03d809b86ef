//! Configuration for a ShoalKV instance.
//!
//! Loaded from a JSON file with camelCase keys; every field has a default
//! and unknown keys are ignored, so older config files keep working.
//!
//! ```json
//! {
//!   "sstableDirectory": "data",
//!   "bloomFilterSize": 1000,
//!   "bloomHashCount": 3,
//!   "maxKeysPerSSTable": 1000,
//!   "compactionThreshold": 3,
//!   "routerInstances": 4,
//!   "listenAddr": "127.0.0.1:8080",
//!   "maxConnections": 1024
//! }
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Main configuration for a ShoalKV instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the SSTable files.
    pub sstable_directory: PathBuf,

    /// Membership-filter size in bits, per table.
    pub bloom_filter_size: usize,

    /// Number of filter probes per key.
    pub bloom_hash_count: u32,

    /// Distinct-key threshold that seals the active table.
    #[serde(rename = "maxKeysPerSSTable")]
    pub max_keys_per_sstable: usize,

    /// Table count above which compaction runs; 0 disables it.
    pub compaction_threshold: usize,

    /// Number of router workers serving connections.
    pub router_instances: usize,

    /// TCP listen address for serve mode.
    pub listen_addr: String,

    /// Maximum concurrent client connections.
    pub max_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sstable_directory: PathBuf::from("data"),
            bloom_filter_size: engine::DEFAULT_BLOOM_BITS,
            bloom_hash_count: engine::DEFAULT_BLOOM_HASHES,
            max_keys_per_sstable: engine::DEFAULT_MAX_KEYS_PER_TABLE,
            compaction_threshold: engine::DEFAULT_COMPACTION_THRESHOLD,
            router_instances: default_router_instances(),
            listen_addr: "127.0.0.1:8080".to_string(),
            max_connections: 1024,
        }
    }
}

impl Config {
    /// Loads a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// The engine options this config implies.
    #[must_use]
    pub fn engine_options(&self) -> engine::Options {
        engine::Options {
            bloom_bits: self.bloom_filter_size,
            bloom_hashes: self.bloom_hash_count,
            max_keys_per_table: self.max_keys_per_sstable,
            compaction_threshold: self.compaction_threshold,
        }
    }
}

fn default_router_instances() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}
