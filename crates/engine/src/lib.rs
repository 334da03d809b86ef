//! # Engine - ShoalKV Persistence Manager
//!
//! Owns the set of [`sstable::SSTable`]s in one data directory and
//! coordinates every operation that touches them.
//!
//! ## Architecture
//!
//! ```text
//! Router / actor mailbox
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                TABLE MANAGER                  │
//! │                                               │
//! │ write.rs → append to the Active table         │
//! │              |                                │
//! │              |  (key count at threshold?)     │
//! │              |            yes                 │
//! │              v                                │
//! │           roll() → seal + fresh Active        │
//! │              |                                │
//! │              |  (table count > threshold?)    │
//! │              |            yes                 │
//! │              v                                │
//! │           compact() → merge 3 oldest          │
//! │                                               │
//! │ read.rs → tables newest-first, filter-gated   │
//! │            (first value found wins)           │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Table list
//!
//! `tables` is kept ascending by creation time; lookups walk it in
//! reverse so the most recent write of a key always shadows older copies.
//! The Active table is the last element: rolls append the fresh table,
//! and compaction only ever touches the front of the list.
//!
//! ## Crash safety
//!
//! Every table append lands in its data file before anything else is
//! updated, and startup recovery rebuilds each table's index and filter
//! from the data file alone (`recovery.rs`). The index sidecars are
//! advisory, so there is no window where a crash loses an acknowledged,
//! flushed write.

mod compaction;
mod read;
mod recovery;
mod write;

use std::path::{Path, PathBuf};

use anyhow::Result;
use sstable::{SSTable, TableState};

/// Default membership-filter size in bits.
pub const DEFAULT_BLOOM_BITS: usize = 1000;
/// Default number of filter probes per key.
pub const DEFAULT_BLOOM_HASHES: u32 = 3;
/// Default number of distinct keys an Active table holds before it is
/// sealed.
pub const DEFAULT_MAX_KEYS_PER_TABLE: usize = 1000;
/// Default table-count threshold above which compaction runs. `0`
/// disables automatic compaction.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 3;

/// Tuning knobs for a [`TableManager`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Membership-filter size in bits (per table).
    pub bloom_bits: usize,
    /// Number of filter probes per key.
    pub bloom_hashes: u32,
    /// Distinct-key threshold that seals the Active table.
    pub max_keys_per_table: usize,
    /// Compaction runs when the table count exceeds this. `0` disables it.
    pub compaction_threshold: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bloom_bits: DEFAULT_BLOOM_BITS,
            bloom_hashes: DEFAULT_BLOOM_HASHES,
            max_keys_per_table: DEFAULT_MAX_KEYS_PER_TABLE,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}

/// The persistence manager: an ordered list of tables, exactly one of
/// which is Active, plus the monotonic counter that names new tables.
///
/// The manager is single-owner; the persistence actor serializes all
/// access through its mailbox.
pub struct TableManager {
    dir: PathBuf,
    opts: Options,
    /// Ascending by creation time; the Active table is last.
    tables: Vec<SSTable>,
    /// Highest `<N>` ever used in a `sstable_<N>` name.
    counter: u64,
}

impl TableManager {
    /// Opens a manager over `dir`, recovering any existing tables and
    /// creating a fresh Active table.
    ///
    /// Recovery scans for `*.sst` files, rebuilds each table's index and
    /// filter from its data file (ignoring sidecars), orders the loaded
    /// tables by creation time, and resumes the naming counter past the
    /// highest recovered name.
    pub fn open<P: AsRef<Path>>(dir: P, opts: Options) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let (tables, counter) = recovery::load_existing(&dir, &opts)?;

        let mut manager = Self {
            dir,
            opts,
            tables,
            counter,
        };
        manager.create_active()?;
        Ok(manager)
    }

    /// Total number of tables, including the Active one.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of Sealed tables.
    #[must_use]
    pub fn sealed_count(&self) -> usize {
        self.tables.len() - 1
    }

    /// Distinct-key count of the Active table.
    #[must_use]
    pub fn active_key_count(&self) -> usize {
        self.active().key_count()
    }

    /// Name of the Active table.
    #[must_use]
    pub fn active_name(&self) -> &str {
        self.active().name()
    }

    /// Read-only snapshot of the table list, oldest first.
    #[must_use]
    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            tables: self
                .tables
                .iter()
                .map(|t| TableStats {
                    name: t.name().to_string(),
                    state: t.state(),
                    key_count: t.key_count(),
                })
                .collect(),
        }
    }

    pub(crate) fn active(&self) -> &SSTable {
        self.tables.last().expect("manager always holds an active table")
    }

    pub(crate) fn active_mut(&mut self) -> &mut SSTable {
        self.tables.last_mut().expect("manager always holds an active table")
    }

    pub(crate) fn tables(&self) -> &[SSTable] {
        &self.tables
    }

    /// Claims the next name from the monotonic counter.
    pub(crate) fn next_table_name(&mut self) -> String {
        self.counter += 1;
        format!("sstable_{}", self.counter)
    }

    /// Creates a fresh Active table and appends it to the list.
    pub(crate) fn create_active(&mut self) -> Result<()> {
        let name = self.next_table_name();
        let table = SSTable::create(
            &self.dir,
            &name,
            self.opts.bloom_bits,
            self.opts.bloom_hashes,
        )?;
        tracing::info!(table = %name, "created active table");
        self.tables.push(table);
        Ok(())
    }
}

impl std::fmt::Debug for TableManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableManager")
            .field("dir", &self.dir)
            .field("tables", &self.tables.len())
            .field("active", &self.active().name())
            .field("counter", &self.counter)
            .finish()
    }
}

/// Snapshot of one table for diagnostics.
#[derive(Debug, Clone)]
pub struct TableStats {
    pub name: String,
    pub state: TableState,
    pub key_count: usize,
}

/// Snapshot of the whole table list, oldest first.
#[derive(Debug, Clone)]
pub struct ManagerStats {
    pub tables: Vec<TableStats>,
}

impl ManagerStats {
    /// The tables currently marked Active (the invariant says exactly one).
    pub fn active_tables(&self) -> impl Iterator<Item = &TableStats> {
        self.tables
            .iter()
            .filter(|t| t.state == TableState::Active)
    }

    /// Total distinct keys across all tables.
    #[must_use]
    pub fn total_keys(&self) -> usize {
        self.tables.iter().map(|t| t.key_count).sum()
    }
}

#[cfg(test)]
mod tests;
