/// Compaction: merges the three oldest Sealed tables into one.
///
/// The merged table is built with last-write-wins semantics (sources are
/// replayed oldest to newest, and each write moves the merged index to the
/// newest offset), then sealed and swapped into the list in place of its
/// sources, whose files are deleted.
use anyhow::{ensure, Context, Result};
use sstable::SSTable;

use crate::TableManager;

/// How many of the oldest Sealed tables one compaction merges.
pub const COMPACT_SOURCES: usize = 3;

impl TableManager {
    /// Merges the three oldest Sealed tables into a single new Sealed
    /// table and deletes the sources.
    ///
    /// No-op when fewer than three Sealed tables exist. Called
    /// automatically from [`TableManager::roll`] when the table count
    /// exceeds the compaction threshold; may also be invoked directly.
    pub fn compact(&mut self) -> Result<()> {
        if self.sealed_count() < COMPACT_SOURCES {
            return Ok(());
        }
        // The Active table is the newest (last); the front of the list is
        // always Sealed by the time three or more Sealed tables exist.
        ensure!(
            self.tables()[..COMPACT_SOURCES].iter().all(|t| !t.is_active()),
            "compaction sources must be sealed"
        );

        let name = self.next_table_name();
        let mut merged = SSTable::create(&self.dir, &name, self.opts.bloom_bits, self.opts.bloom_hashes)
            .with_context(|| format!("creating merged table {name}"))?;

        if let Err(e) = self.build_merged(&mut merged) {
            let merged_name = merged.name().to_string();
            if let Err(cleanup) = merged.delete() {
                tracing::warn!(table = %merged_name, error = %cleanup, "failed to remove abandoned merge target");
            }
            return Err(e).with_context(|| format!("building merged table {merged_name}"));
        }

        let sources: Vec<SSTable> = self.tables.drain(..COMPACT_SOURCES).collect();
        let source_names: Vec<&str> = sources.iter().map(SSTable::name).collect();
        tracing::info!(
            sources = ?source_names,
            merged = %merged.name(),
            keys = merged.key_count(),
            "compacted tables"
        );

        self.tables.insert(0, merged);
        // Same ordering as recovery: creation time, name as the
        // deterministic tie-break. The merged table inherited its newest
        // source's creation time, so it lands where its sources were.
        self.tables.sort_by(|a, b| {
            a.creation_time()
                .cmp(&b.creation_time())
                .then_with(|| a.name().cmp(b.name()))
        });

        let mut first_err = None;
        for source in sources {
            let source_name = source.name().to_string();
            if let Err(e) = source.delete() {
                tracing::warn!(table = %source_name, error = %e, "failed to delete compacted source");
                first_err.get_or_insert_with(|| {
                    anyhow::Error::new(e)
                        .context(format!("deleting compacted source {source_name}"))
                });
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Replays every source entry into `merged`, oldest source first, then
    /// seals it and hands it the newest source's creation time.
    fn build_merged(&self, merged: &mut SSTable) -> Result<()> {
        for source in &self.tables()[..COMPACT_SOURCES] {
            for key in source.all_keys() {
                if let Some(value) = source
                    .read(key)
                    .with_context(|| format!("reading {key:?} from {}", source.name()))?
                {
                    merged.write(key, &value)?;
                }
            }
        }
        merged.seal();

        // The merged data is no newer than the newest source; keeping that
        // table's timestamp preserves the newest-first lookup order, both
        // in memory and across a restart.
        let inherited = self.tables()[COMPACT_SOURCES - 1].creation_time();
        merged.set_creation_time(inherited)?;
        Ok(())
    }
}
