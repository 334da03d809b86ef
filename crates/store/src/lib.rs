//! # Store - ShoalKV actor runtime
//!
//! Wires the persistence engine, the in-memory cache, and the request
//! router into a running system.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │          (accept loop + router worker pool)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Router                                 │
//! │   PUT → Cache + Persistence (ack after both)                 │
//! │   GET → Cache, then Persistence on miss                      │
//! └──────────┬──────────────────────────┬───────────────────────┘
//!            │                          │ mailbox (crossbeam)
//!            ▼                          ▼
//!     ┌─────────────┐          ┌──────────────────┐
//!     │    Cache    │          │ Persistence actor │
//!     │  (RwLock    │          │  (own OS thread,  │
//!     │   HashMap)  │          │   TableManager)   │
//!     └─────────────┘          └──────────────────┘
//! ```
//!
//! Each actor runs on its own OS thread and processes its mailbox in
//! arrival order; the persistence actor's thread doubles as the dedicated
//! blocking-I/O context, so table reads and writes never stall a request
//! handler. The cache is not an actor: it is a shared concurrent map with
//! per-key linearizability, which is all the router needs from it.

pub mod cache;
pub mod config;
pub mod persist;
pub mod router;
pub mod server;

pub use cache::Cache;
pub use config::Config;
pub use persist::PersistenceHandle;
pub use router::{GetRequest, GetResponse, PutEntry, PutRequest, Router};
pub use server::Server;

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use engine::{ManagerStats, TableManager};

/// A running store: the persistence actor plus the handles every ingress
/// needs. Dropping the store shuts the actor down and joins its thread.
pub struct Store {
    router: Router,
    persist: PersistenceHandle,
    actor: Option<JoinHandle<()>>,
}

impl Store {
    /// Opens the persistence tier under the configured directory, spawns
    /// the persistence actor, and assembles the router.
    pub fn open(config: &Config) -> Result<Self> {
        let manager = TableManager::open(&config.sstable_directory, config.engine_options())
            .context("opening table manager")?;
        let (persist, actor) = persist::spawn(manager)?;
        let cache = Arc::new(Cache::new());
        let router = Router::new(cache, persist.clone());
        Ok(Self {
            router,
            persist,
            actor: Some(actor),
        })
    }

    /// A cheap, cloneable router over this store.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Snapshot of the persistence tier's table list.
    pub fn stats(&self) -> Result<ManagerStats> {
        self.persist.stats()
    }

    /// Seals the active table now (the shell's `SEAL` command).
    pub fn roll(&self) -> Result<()> {
        self.persist.roll()
    }

    /// Runs a compaction pass now (the shell's `COMPACT` command).
    pub fn compact(&self) -> Result<()> {
        self.persist.compact()
    }

    /// Stops the persistence actor and waits for it to drain its mailbox.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(actor) = self.actor.take() {
            self.persist.send_shutdown();
            if actor.join().is_err() {
                tracing::error!("persistence actor panicked during shutdown");
            }
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests;
