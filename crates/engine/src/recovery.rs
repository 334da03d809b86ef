/// Startup recovery: directory scan and counter resumption.
///
/// Every `*.sst` file in the data directory is opened as a Sealed table;
/// [`sstable::SSTable::open`] rebuilds its index and filter from the data
/// file, ignoring whatever the sidecar says. Loaded tables are ordered by
/// creation time (name as the deterministic tie-break), and the naming
/// counter resumes past the highest recovered `sstable_<N>` so restarts
/// never reuse a name.
use std::path::Path;

use anyhow::{Context, Result};
use sstable::{SSTable, DATA_EXT};

use crate::Options;

pub(crate) fn load_existing(dir: &Path, opts: &Options) -> Result<(Vec<SSTable>, u64)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;

    let mut tables = Vec::new();
    let mut counter = 0u64;

    for dir_entry in std::fs::read_dir(dir)? {
        let path = dir_entry?.path();
        if !path.is_file() || path.extension().map_or(true, |e| e != DATA_EXT) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let table = SSTable::open(dir, name, opts.bloom_bits, opts.bloom_hashes)
            .with_context(|| format!("recovering table {name}"))?;
        tracing::info!(table = %name, keys = table.key_count(), "recovered table");

        match parse_table_id(name) {
            Some(id) => counter = counter.max(id),
            None => tracing::debug!(table = %name, "table name outside the counter scheme"),
        }
        tables.push(table);
    }

    tables.sort_by(|a, b| {
        a.creation_time()
            .cmp(&b.creation_time())
            .then_with(|| a.name().cmp(b.name()))
    });

    Ok((tables, counter))
}

/// Extracts `<N>` from a `sstable_<N>` table name.
fn parse_table_id(name: &str) -> Option<u64> {
    name.strip_prefix("sstable_")?.parse().ok()
}
