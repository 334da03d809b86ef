use std::io;

use thiserror::Error;

/// Result type alias for table operations.
pub type Result<T> = std::result::Result<T, SstError>;

/// Error kinds distinguished by the storage core.
///
/// `MalformedEntry` and `IndexMismatch` are soft: they are logged and
/// converted to misses at the table boundary, never surfaced to callers.
/// Everything else propagates.
#[derive(Debug, Error)]
pub enum SstError {
    /// Filesystem failure during read, write, create, or delete.
    #[error("io error: {0}")]
    Io(#[source] io::Error),

    /// The table cannot grow because the disk is full.
    #[error("table cannot grow: {0}")]
    Capacity(#[source] io::Error),

    /// A data-file line could not be parsed.
    #[error("malformed entry at byte {offset}: {reason}")]
    MalformedEntry { offset: u64, reason: String },

    /// The index pointed at a line for a different key (stale index).
    #[error("index for {expected:?} found {found:?} at byte {offset}")]
    IndexMismatch {
        expected: String,
        found: String,
        offset: u64,
    },

    /// Write attempted on a sealed table. Always a caller bug.
    #[error("write to sealed table {0}")]
    Sealed(String),

    /// The key violates the on-disk format (empty, comma, or newline).
    #[error("invalid key {0:?}: {1}")]
    InvalidKey(String, &'static str),

    /// The value violates the on-disk format (newline).
    #[error("invalid value for key {0:?}: {1}")]
    InvalidValue(String, &'static str),
}

impl From<io::Error> for SstError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::StorageFull {
            SstError::Capacity(e)
        } else {
            SstError::Io(e)
        }
    }
}
