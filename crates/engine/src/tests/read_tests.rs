use anyhow::Result;
use tempfile::tempdir;

use super::helpers::open_manager;

// --------------------- Newest-first visibility ---------------------

#[test]
fn newer_table_shadows_older_one() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 1000, 0)?;

    manager.put("a", "1")?;
    manager.put("a", "2")?;
    assert_eq!(manager.get("a")?, Some("2".to_string()));

    manager.roll()?;
    manager.put("a", "3")?;

    // The sealed table still holds the old copy, but the active table wins.
    assert_eq!(manager.get("a")?, Some("3".to_string()));
    let stats = manager.stats();
    assert_eq!(stats.tables[0].key_count, 1, "sealed copy is still on disk");
    Ok(())
}

#[test]
fn keys_remain_visible_across_several_sealed_tables() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 2, 0)?;

    for i in 0..9 {
        manager.put(&format!("key{}", i), &format!("v{}", i))?;
    }
    assert!(manager.sealed_count() >= 3);

    for i in 0..9 {
        assert_eq!(
            manager.get(&format!("key{}", i))?,
            Some(format!("v{}", i))
        );
    }
    Ok(())
}

// --------------------- Misses ---------------------

#[test]
fn absent_key_is_a_clean_miss() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 2, 0)?;

    for i in 0..6 {
        manager.put(&format!("key{}", i), "v")?;
    }
    assert_eq!(manager.get("never-written")?, None);
    Ok(())
}

#[test]
fn get_on_empty_manager_returns_none() -> Result<()> {
    let dir = tempdir()?;
    let manager = open_manager(dir.path(), 1000, 0)?;
    assert_eq!(manager.get("anything")?, None);
    Ok(())
}

// --------------------- Values with commas ---------------------

#[test]
fn comma_joined_values_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let mut manager = open_manager(dir.path(), 1000, 0)?;

    manager.put("list", "a,b,c")?;
    assert_eq!(manager.get("list")?, Some("a,b,c".to_string()));
    Ok(())
}
