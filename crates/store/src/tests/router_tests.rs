use anyhow::Result;
use tempfile::tempdir;

use super::test_config;
use crate::{GetRequest, PutEntry, PutRequest, Store};

fn put_request(entries: &[(&str, &[&str])]) -> PutRequest {
    PutRequest {
        new_keys: entries
            .iter()
            .map(|(key, value)| PutEntry {
                key: key.to_string(),
                value: value.iter().map(|v| v.to_string()).collect(),
            })
            .collect(),
    }
}

fn get_request(keys: &[&str]) -> GetRequest {
    GetRequest {
        keys: keys.iter().map(|k| k.to_string()).collect(),
    }
}

// --------------------- PUT / GET fan-out ---------------------

#[test]
fn put_then_get_preserves_order_and_misses() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&test_config(dir.path(), 1000))?;
    let router = store.router();

    router.put(put_request(&[("a", &["1"]), ("b", &["2"])]))?;

    let response = router.get(&get_request(&["a", "b", "c"]))?;
    assert_eq!(
        response.value,
        vec![vec!["1".to_string()], vec!["2".to_string()], vec![]]
    );

    store.close();
    Ok(())
}

#[test]
fn value_fragments_join_and_split_back() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&test_config(dir.path(), 1000))?;
    let router = store.router();

    router.put(put_request(&[("list", &["a", "b", "c"])]))?;

    let response = router.get(&get_request(&["list"]))?;
    assert_eq!(
        response.value,
        vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]]
    );

    store.close();
    Ok(())
}

#[test]
fn empty_fragment_list_stores_empty_string() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&test_config(dir.path(), 1000))?;
    let router = store.router();

    router.put(put_request(&[("k", &[])]))?;

    // Only NOT_FOUND yields an empty array; an empty stored value splits
    // into one empty fragment.
    let response = router.get(&get_request(&["k", "missing"]))?;
    assert_eq!(response.value, vec![vec![String::new()], vec![]]);

    store.close();
    Ok(())
}

// --------------------- Ack-after-both ---------------------

#[test]
fn put_ack_means_both_tiers_hold_the_batch() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&test_config(dir.path(), 1000))?;
    let router = store.router();

    router.put(put_request(&[("k", &["v"])]))?;

    // The persistence tier answers without the cache's help.
    let stats = store.stats()?;
    assert_eq!(stats.total_keys(), 1);

    store.close();
    Ok(())
}

#[test]
fn persisted_writes_survive_store_restart() -> Result<()> {
    let dir = tempdir()?;
    {
        let store = Store::open(&test_config(dir.path(), 2))?;
        let router = store.router();
        for i in 0..5 {
            let key = format!("key{}", i);
            router.put(put_request(&[(key.as_str(), &["v"])]))?;
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        store.close();
    }

    // A fresh store has a cold cache; every hit comes from disk.
    let store = Store::open(&test_config(dir.path(), 2))?;
    let router = store.router();
    let response = router.get(&get_request(&["key0", "key1", "key2", "key3", "key4"]))?;
    assert_eq!(response.value, vec![vec!["v".to_string()]; 5]);

    store.close();
    Ok(())
}

// --------------------- Failures ---------------------

#[test]
fn invalid_key_fails_the_put() -> Result<()> {
    let dir = tempdir()?;
    let store = Store::open(&test_config(dir.path(), 1000))?;
    let router = store.router();

    assert!(router.put(put_request(&[("bad,key", &["v"])])).is_err());

    // The router keeps working afterwards.
    router.put(put_request(&[("good", &["v"])]))?;
    assert_eq!(
        router.get(&get_request(&["good"]))?.value,
        vec![vec!["v".to_string()]]
    );

    store.close();
    Ok(())
}
