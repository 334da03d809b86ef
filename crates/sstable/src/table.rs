use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bloom::BloomFilter;

use crate::entry;
use crate::error::{Result, SstError};

/// File extension of the data file.
pub const DATA_EXT: &str = "sst";
/// File extension of the index sidecar.
pub const INDEX_EXT: &str = "index";

/// Lifecycle state of a table.
///
/// The transition is one-way: a table is created `Active`, is sealed
/// exactly once, and a `Sealed` table only ever disappears by deletion
/// during compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Accepting appends.
    Active,
    /// Immutable; read-only until compacted away.
    Sealed,
}

/// One on-disk table: an append-only data file, an advisory index sidecar,
/// an in-memory offset index, and a membership filter seeded with every
/// indexed key.
///
/// All mutation is serialized by the owning manager; the type itself is
/// single-owner and does no locking.
pub struct SSTable {
    name: String,
    data_path: PathBuf,
    index_path: PathBuf,
    /// key → byte offset of the line holding the current value.
    index: HashMap<String, u64>,
    filter: BloomFilter,
    state: TableState,
    /// Last-modified time of the data file, refreshed on every append.
    created: SystemTime,
}

impl SSTable {
    /// Creates a fresh `Active` table named `name` inside `dir`.
    ///
    /// Both files are created eagerly (the data file empty, the sidecar
    /// empty) so that `creation_time` is meaningful from the start.
    ///
    /// # Errors
    ///
    /// Fails if a table of the same name already exists or on any
    /// filesystem error.
    pub fn create(dir: &Path, name: &str, bloom_bits: usize, bloom_hashes: u32) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let data_path = dir.join(format!("{name}.{DATA_EXT}"));
        let index_path = dir.join(format!("{name}.{INDEX_EXT}"));

        let data_file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&data_path)?;
        File::create(&index_path)?;

        let created = data_file.metadata()?.modified()?;

        Ok(Self {
            name: name.to_string(),
            data_path,
            index_path,
            index: HashMap::new(),
            filter: BloomFilter::new(bloom_bits, bloom_hashes),
            state: TableState::Active,
            created,
        })
    }

    /// Opens an existing table in `Sealed` state, rebuilding the index and
    /// the filter from the data file.
    ///
    /// The sidecar on disk is ignored (it may be stale if the process died
    /// between a data append and the sidecar rewrite) and is rewritten
    /// from the rebuilt index before this returns. Lines that cannot be
    /// parsed are logged and skipped; a trailing line without a newline is
    /// treated as a torn append and skipped as well.
    pub fn open(dir: &Path, name: &str, bloom_bits: usize, bloom_hashes: u32) -> Result<Self> {
        let data_path = dir.join(format!("{name}.{DATA_EXT}"));
        let index_path = dir.join(format!("{name}.{INDEX_EXT}"));

        let data_file = File::open(&data_path)?;
        let created = data_file.metadata()?.modified()?;

        let mut filter = BloomFilter::new(bloom_bits, bloom_hashes);
        let mut index = HashMap::new();

        let mut reader = BufReader::new(data_file);
        let mut buf = Vec::new();
        let mut offset: u64 = 0;
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            match parse_data_line(&buf, offset) {
                Ok((key, _value)) => {
                    filter.add(&key);
                    // Last occurrence wins; earlier lines become dead bytes.
                    index.insert(key, offset);
                }
                Err(e) => {
                    tracing::warn!(table = %name, error = %e, "skipping unreadable entry");
                }
            }
            offset += n as u64;
        }

        let table = Self {
            name: name.to_string(),
            data_path,
            index_path,
            index,
            filter,
            state: TableState::Sealed,
            created,
        };
        table.save_index()?;
        Ok(table)
    }

    /// Appends one entry.
    ///
    /// Steps: append `key,value\n` to the data file, update the in-memory
    /// index and the filter, then rewrite the sidecar in full. A failed
    /// append truncates the data file back to its previous length, leaving
    /// the table unchanged. A failed sidecar rewrite surfaces as an error
    /// but leaves the table readable: recovery rebuilds the sidecar from
    /// the data file.
    pub fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.state == TableState::Sealed {
            return Err(SstError::Sealed(self.name.clone()));
        }
        entry::check_key(key)?;
        entry::check_value(key, value)?;

        let mut file = OpenOptions::new().append(true).open(&self.data_path)?;
        let off = file.metadata()?.len();

        let line = entry::encode(key, value);
        if let Err(e) = file.write_all(line.as_bytes()).and_then(|()| file.flush()) {
            // Roll back a partial append so the index never points past a
            // torn line.
            let _ = file.set_len(off);
            return Err(e.into());
        }

        self.index.insert(key.to_string(), off);
        self.filter.add(key);
        self.created = file.metadata()?.modified()?;

        self.save_index()
    }

    /// Looks up a key.
    ///
    /// The filter is probed first; a negative answer avoids any disk
    /// access. A stale index entry (the line on disk belongs to a
    /// different key, or cannot be parsed) is logged and reported as a
    /// miss rather than an error.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        if !self.filter.might_contain(key) {
            return Ok(None);
        }
        let Some(&offset) = self.index.get(key) else {
            return Ok(None);
        };

        match self.read_at(offset, key) {
            Ok(value) => Ok(Some(value)),
            Err(e @ (SstError::IndexMismatch { .. } | SstError::MalformedEntry { .. })) => {
                tracing::warn!(table = %self.name, error = %e, "treating stale index entry as a miss");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Reads the line at `offset` and returns its value, verifying that
    /// the line's key matches the requested one.
    fn read_at(&self, offset: u64, key: &str) -> Result<String> {
        let mut file = File::open(&self.data_path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::new();
        BufReader::new(file).read_until(b'\n', &mut buf)?;

        let (found, value) = parse_data_line(&buf, offset)?;
        if found != key {
            return Err(SstError::IndexMismatch {
                expected: key.to_string(),
                found,
                offset,
            });
        }
        Ok(value)
    }

    /// Probes the membership filter.
    #[must_use]
    pub fn might_contain(&self, key: &str) -> bool {
        self.filter.might_contain(key)
    }

    /// Marks the table sealed. One-way; further writes are rejected.
    pub fn seal(&mut self) {
        self.state = TableState::Sealed;
    }

    /// Removes both files. Only compaction calls this, after the surviving
    /// keys have been persisted into the merged table.
    pub fn delete(self) -> Result<()> {
        remove_if_present(&self.data_path)?;
        remove_if_present(&self.index_path)?;
        Ok(())
    }

    /// Keys currently in the index, in unspecified order.
    pub fn all_keys(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Number of distinct keys in the index.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn state(&self) -> TableState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TableState::Active
    }

    /// Last-modified time of the data file, the ordering key for the
    /// manager's table list.
    #[must_use]
    pub fn creation_time(&self) -> SystemTime {
        self.created
    }

    /// Path of the data file (diagnostics and tests).
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Path of the index sidecar (diagnostics and tests).
    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Overrides the table's creation time, on disk and in memory.
    ///
    /// Compaction gives a merged table the creation time of its newest
    /// source: the merged data is no newer than that source, and the
    /// newest-first lookup order must keep treating it that way.
    pub fn set_creation_time(&mut self, to: SystemTime) -> Result<()> {
        let file = OpenOptions::new().append(true).open(&self.data_path)?;
        file.set_modified(to)?;
        self.created = to;
        Ok(())
    }

    /// Rewrites the sidecar in full (truncate + all `key,offset` lines).
    fn save_index(&self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.index_path)?;
        let mut writer = BufWriter::new(file);
        for (key, &offset) in &self.index {
            writer.write_all(entry::encode_index_line(key, offset).as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for SSTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SSTable")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("key_count", &self.index.len())
            .finish()
    }
}

/// Decodes one raw data-file line read at `offset`.
///
/// Rejects lines that are not UTF-8, have no comma, have an empty key, or
/// are missing their trailing newline (a torn append).
fn parse_data_line(raw: &[u8], offset: u64) -> Result<(String, String)> {
    let malformed = |reason: &str| SstError::MalformedEntry {
        offset,
        reason: reason.to_string(),
    };

    let line = std::str::from_utf8(raw).map_err(|_| malformed("not valid utf-8"))?;
    let line = line
        .strip_suffix('\n')
        .ok_or_else(|| malformed("no trailing newline (torn append)"))?;
    let (key, value) = entry::split(line).ok_or_else(|| malformed("no comma separator"))?;
    if key.is_empty() {
        return Err(malformed("empty key"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
