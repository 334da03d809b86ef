use std::fs;
use std::path::Path;

use crate::{Options, TableManager};

/// Opens a manager with test-sized thresholds. `compaction_threshold = 0`
/// disables automatic compaction.
pub fn open_manager(
    dir: &Path,
    max_keys: usize,
    compaction_threshold: usize,
) -> anyhow::Result<TableManager> {
    TableManager::open(
        dir,
        Options {
            max_keys_per_table: max_keys,
            compaction_threshold,
            ..Options::default()
        },
    )
}

pub fn count_data_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}

/// Short pause so consecutive table files get distinct modified times;
/// recovery orders tables by mtime.
pub fn settle_mtime() {
    std::thread::sleep(std::time::Duration::from_millis(5));
}
