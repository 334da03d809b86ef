use std::path::PathBuf;

use anyhow::Result;
use tempfile::tempdir;

use crate::Config;

#[test]
fn load_parses_camel_case_keys() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "sstableDirectory": "/tmp/shoal-data",
            "bloomFilterSize": 2048,
            "bloomHashCount": 5,
            "maxKeysPerSSTable": 50,
            "compactionThreshold": 4,
            "routerInstances": 8,
            "listenAddr": "0.0.0.0:9000",
            "maxConnections": 64
        }"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.sstable_directory, PathBuf::from("/tmp/shoal-data"));
    assert_eq!(config.bloom_filter_size, 2048);
    assert_eq!(config.bloom_hash_count, 5);
    assert_eq!(config.max_keys_per_sstable, 50);
    assert_eq!(config.compaction_threshold, 4);
    assert_eq!(config.router_instances, 8);
    assert_eq!(config.listen_addr, "0.0.0.0:9000");
    assert_eq!(config.max_connections, 64);
    Ok(())
}

#[test]
fn missing_keys_fall_back_to_defaults() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"sstableDirectory": "elsewhere"}"#)?;

    let config = Config::load(&path)?;
    assert_eq!(config.sstable_directory, PathBuf::from("elsewhere"));
    assert_eq!(config.bloom_filter_size, engine::DEFAULT_BLOOM_BITS);
    assert_eq!(config.max_keys_per_sstable, engine::DEFAULT_MAX_KEYS_PER_TABLE);
    Ok(())
}

#[test]
fn unknown_keys_are_ignored() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    // Deployment knobs from older configurations load without error.
    std::fs::write(
        &path,
        r#"{"cacheInstances": 2, "workerPoolSize": 16, "bloomHashCount": 7}"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.bloom_hash_count, 7);
    Ok(())
}

#[test]
fn malformed_config_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    std::fs::write(&path, "not json at all")?;
    assert!(Config::load(&path).is_err());
    Ok(())
}

#[test]
fn engine_options_reflect_config() {
    let config = Config {
        bloom_filter_size: 123,
        bloom_hash_count: 2,
        max_keys_per_sstable: 9,
        compaction_threshold: 7,
        ..Config::default()
    };
    let opts = config.engine_options();
    assert_eq!(opts.bloom_bits, 123);
    assert_eq!(opts.bloom_hashes, 2);
    assert_eq!(opts.max_keys_per_table, 9);
    assert_eq!(opts.compaction_threshold, 7);
}
