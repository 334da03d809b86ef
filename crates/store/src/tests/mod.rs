use std::path::Path;

use crate::Config;

mod config_tests;
mod router_tests;

/// Config pointing at a test directory, with small thresholds and an
/// ephemeral listen port.
pub fn test_config(dir: &Path, max_keys: usize) -> Config {
    Config {
        sstable_directory: dir.to_path_buf(),
        max_keys_per_sstable: max_keys,
        compaction_threshold: 0,
        router_instances: 2,
        listen_addr: "127.0.0.1:0".to_string(),
        ..Config::default()
    }
}
