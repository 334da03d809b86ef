use anyhow::Result;
use sstable::TableState;
use tempfile::tempdir;

use super::helpers::open_manager;

// --------------------- Put / get ---------------------

#[test]
fn put_get_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 1000, 0)?;

    manager.put("a", "1")?;
    manager.put("b", "2")?;

    assert_eq!(manager.get("a")?, Some("1".to_string()));
    assert_eq!(manager.get("b")?, Some("2".to_string()));
    assert_eq!(manager.get("c")?, None);
    Ok(())
}

#[test]
fn overwrite_returns_newest() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 1000, 0)?;

    manager.put("k", "v1")?;
    manager.put("k", "v2")?;

    assert_eq!(manager.get("k")?, Some("v2".to_string()));
    Ok(())
}

#[test]
fn rewriting_a_key_does_not_grow_the_key_count() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 2, 0)?;

    manager.put("k", "v1")?;
    manager.put("k", "v2")?;
    manager.put("k", "v3")?;

    // Still one distinct key, so no roll happened.
    assert_eq!(manager.table_count(), 1);
    assert_eq!(manager.active_key_count(), 1);
    Ok(())
}

// --------------------- Roll at threshold ---------------------

#[test]
fn roll_seals_full_table_and_opens_fresh_one() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 2, 0)?;

    manager.put("a", "1")?;
    manager.put("b", "2")?;
    manager.put("c", "3")?; // crosses the threshold, rolls first

    let stats = manager.stats();
    assert_eq!(stats.tables.len(), 2);
    assert_eq!(stats.tables[0].state, TableState::Sealed);
    assert_eq!(stats.tables[0].key_count, 2);
    assert_eq!(stats.tables[1].state, TableState::Active);
    assert_eq!(stats.tables[1].key_count, 1);

    assert_eq!(manager.get("a")?, Some("1".to_string()));
    assert_eq!(manager.get("c")?, Some("3".to_string()));
    Ok(())
}

#[test]
fn active_key_count_never_exceeds_threshold() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 5, 0)?;

    for i in 0..23 {
        manager.put(&format!("key{:02}", i), "v")?;
        assert!(
            manager.active_key_count() <= 5,
            "active table grew past the bound: {}",
            manager.active_key_count()
        );
    }
    Ok(())
}

#[test]
fn exactly_one_active_table_at_all_times() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 2, 0)?;

    for i in 0..10 {
        manager.put(&format!("key{}", i), "v")?;
        assert_eq!(manager.stats().active_tables().count(), 1);
    }

    manager.roll()?;
    assert_eq!(manager.stats().active_tables().count(), 1);
    Ok(())
}

#[test]
fn explicit_roll_works_below_threshold() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 1000, 0)?;

    manager.put("a", "1")?;
    let before = manager.active_name().to_string();
    manager.roll()?;

    assert_ne!(manager.active_name(), before);
    assert_eq!(manager.sealed_count(), 1);
    assert_eq!(manager.get("a")?, Some("1".to_string()));
    Ok(())
}

// --------------------- Errors ---------------------

#[test]
fn rejected_write_leaves_manager_usable() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 1000, 0)?;

    assert!(manager.put("bad,key", "v").is_err());
    assert!(manager.put("", "v").is_err());
    assert!(manager.put("k", "bad\nvalue").is_err());

    // Subsequent operations proceed normally.
    manager.put("k", "v")?;
    assert_eq!(manager.get("k")?, Some("v".to_string()));
    Ok(())
}
