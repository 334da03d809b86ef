/// Read path: `get()`.
///
/// Lookups walk the table list newest-first so the most recent write of a
/// key shadows older copies that may survive in sealed tables until
/// compaction rewrites them. Each table's membership filter is probed
/// before its index, so tables that never saw the key cost no disk I/O.
use anyhow::{Context, Result};

use crate::TableManager;

impl TableManager {
    /// Looks up a key across all tables, newest first.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        for table in self.tables().iter().rev() {
            if !table.might_contain(key) {
                continue;
            }
            if let Some(value) = table
                .read(key)
                .with_context(|| format!("read from table {} failed", table.name()))?
            {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
