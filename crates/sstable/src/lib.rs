//! # SSTable - Sorted String Table
//!
//! Immutable-after-seal, on-disk storage tables for the ShoalKV storage
//! engine.
//!
//! A table is a pair of files plus an in-memory aggregate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ <name>.sst      append-only data file, one entry per line     │
//! │                                                              │
//! │   key,value\n                                                │
//! │                                                              │
//! │   The first comma separates key from value; commas in the    │
//! │   value are permitted, newlines are not. A key rewritten in  │
//! │   the same table leaves its earlier line behind as dead      │
//! │   bytes until compaction rewrites the table.                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ <name>.index    advisory sidecar, rewritten on every append  │
//! │                                                              │
//! │   key,offset\n   (offset = decimal byte position in .sst)    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ in memory       index: key → offset of the newest line       │
//! │                 filter: bloom filter over every indexed key  │
//! │                 state: Active (appendable) or Sealed         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sidecar is advisory only: [`SSTable::open`] always rebuilds the
//! index and the filter by streaming the data file, so a crash between the
//! data append and the sidecar rewrite loses nothing.

mod entry;
mod error;
mod table;

pub use entry::{check_key, check_value};
pub use error::{Result, SstError};
pub use table::{SSTable, TableState, DATA_EXT, INDEX_EXT};

#[cfg(test)]
mod tests;
