/// Write path: `put()` and the seal-and-roll transition.
///
/// Every mutation appends to the Active table. When the Active table's
/// distinct-key count reaches the configured threshold the owner is
/// expected to trigger [`TableManager::roll`]; the persistence actor does
/// this with a self-enqueued seal message so the put that crossed the
/// threshold replies without waiting for compaction work.
use anyhow::{Context, Result};

use crate::TableManager;

impl TableManager {
    /// Appends one entry to the Active table.
    ///
    /// If the Active table is already at the key threshold (a pending seal
    /// message has not been processed yet), the manager rolls inline first
    /// so the Active table never grows past the bound.
    pub fn put(&mut self, key: &str, value: &str) -> Result<()> {
        if self.needs_roll() {
            self.roll().context("roll before put failed")?;
        }
        self.active_mut()
            .write(key, value)
            .with_context(|| format!("write to active table failed for key {key:?}"))?;
        Ok(())
    }

    /// Returns `true` when the Active table has reached the key threshold
    /// and should be sealed.
    #[must_use]
    pub fn needs_roll(&self) -> bool {
        self.active().key_count() >= self.opts.max_keys_per_table
    }

    /// Seals the Active table, creates a fresh one, then evaluates the
    /// compaction policy.
    pub fn roll(&mut self) -> Result<()> {
        let sealed = self.active_mut();
        sealed.seal();
        tracing::info!(
            table = %sealed.name(),
            keys = sealed.key_count(),
            "sealed active table"
        );

        self.create_active().context("creating fresh active table")?;

        if self.opts.compaction_threshold > 0
            && self.table_count() > self.opts.compaction_threshold
        {
            self.compact().context("compaction after roll")?;
        }
        Ok(())
    }
}
