//! Persistence actor.
//!
//! The [`engine::TableManager`] is single-owner, so all access runs
//! through one actor thread with an in-order mailbox. Requests carry a
//! one-shot reply channel; `Seal` is the actor's own fire-and-forget
//! follow-up, enqueued when a put pushes the active table to its key
//! threshold so the put replies without waiting for roll-and-compaction
//! work.
//!
//! A failed operation fails that request only: the actor logs it and
//! keeps draining the mailbox.

use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use crossbeam::channel::{bounded, unbounded, Sender};
use engine::{ManagerStats, TableManager};

/// Messages understood by the persistence actor.
pub enum PersistRequest {
    /// Append a batch of entries, replying once all of them are on disk.
    Put {
        entries: Vec<(String, String)>,
        reply: Sender<Result<()>>,
    },
    /// Look up one key.
    Get {
        key: String,
        reply: Sender<Result<Option<String>>>,
    },
    /// Self-enqueued after a put reaches the key threshold. Seals the
    /// active table unless an inline roll already handled it.
    Seal,
    /// Seal the active table now, regardless of its fill level.
    Roll { reply: Sender<Result<()>> },
    /// Merge the three oldest sealed tables now.
    Compact { reply: Sender<Result<()>> },
    /// Snapshot the table list.
    Stats { reply: Sender<ManagerStats> },
    /// Drain and exit.
    Shutdown,
}

/// Cheap, cloneable handle to the persistence actor's mailbox.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: Sender<PersistRequest>,
}

impl PersistenceHandle {
    /// Appends a batch, blocking until the actor acknowledges it.
    pub fn put(&self, entries: Vec<(String, String)>) -> Result<()> {
        let (reply, done) = bounded(1);
        self.tx
            .send(PersistRequest::Put { entries, reply })
            .map_err(|_| anyhow!("persistence actor is gone"))?;
        done.recv()
            .map_err(|_| anyhow!("persistence actor dropped the reply"))?
    }

    /// Looks up one key.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (reply, done) = bounded(1);
        self.tx
            .send(PersistRequest::Get {
                key: key.to_string(),
                reply,
            })
            .map_err(|_| anyhow!("persistence actor is gone"))?;
        done.recv()
            .map_err(|_| anyhow!("persistence actor dropped the reply"))?
    }

    /// Forces a seal-and-roll of the active table.
    pub fn roll(&self) -> Result<()> {
        let (reply, done) = bounded(1);
        self.tx
            .send(PersistRequest::Roll { reply })
            .map_err(|_| anyhow!("persistence actor is gone"))?;
        done.recv()
            .map_err(|_| anyhow!("persistence actor dropped the reply"))?
    }

    /// Forces a compaction pass.
    pub fn compact(&self) -> Result<()> {
        let (reply, done) = bounded(1);
        self.tx
            .send(PersistRequest::Compact { reply })
            .map_err(|_| anyhow!("persistence actor is gone"))?;
        done.recv()
            .map_err(|_| anyhow!("persistence actor dropped the reply"))?
    }

    /// Snapshots the table list.
    pub fn stats(&self) -> Result<ManagerStats> {
        let (reply, done) = bounded(1);
        self.tx
            .send(PersistRequest::Stats { reply })
            .map_err(|_| anyhow!("persistence actor is gone"))?;
        done.recv()
            .map_err(|_| anyhow!("persistence actor dropped the reply"))
    }

    /// Asks the actor to exit once the mailbox is drained.
    pub(crate) fn send_shutdown(&self) {
        let _ = self.tx.send(PersistRequest::Shutdown);
    }
}

/// Spawns the actor thread around a manager.
pub fn spawn(manager: TableManager) -> Result<(PersistenceHandle, JoinHandle<()>)> {
    let (tx, rx) = unbounded();
    let self_tx = tx.clone();

    let actor = std::thread::Builder::new()
        .name("shoalkv-persist".to_string())
        .spawn(move || run(manager, rx, self_tx))
        .context("spawning persistence actor")?;

    Ok((PersistenceHandle { tx }, actor))
}

fn run(
    mut manager: TableManager,
    rx: crossbeam::channel::Receiver<PersistRequest>,
    self_tx: Sender<PersistRequest>,
) {
    tracing::debug!("persistence actor started");

    for msg in rx.iter() {
        match msg {
            PersistRequest::Put { entries, reply } => {
                let result = handle_put(&mut manager, &self_tx, entries);
                if let Err(ref e) = result {
                    tracing::error!(error = %format!("{e:#}"), "put batch failed");
                }
                let _ = reply.send(result);
            }
            PersistRequest::Get { key, reply } => {
                let result = manager.get(&key);
                if let Err(ref e) = result {
                    tracing::error!(key = %key, error = %format!("{e:#}"), "get failed");
                }
                let _ = reply.send(result);
            }
            PersistRequest::Seal => {
                // Stale if an inline roll already happened since enqueue.
                if manager.needs_roll() {
                    if let Err(e) = manager.roll() {
                        tracing::error!(error = %format!("{e:#}"), "seal failed");
                    }
                }
            }
            PersistRequest::Roll { reply } => {
                let _ = reply.send(manager.roll());
            }
            PersistRequest::Compact { reply } => {
                let _ = reply.send(manager.compact());
            }
            PersistRequest::Stats { reply } => {
                let _ = reply.send(manager.stats());
            }
            PersistRequest::Shutdown => break,
        }
    }

    tracing::debug!("persistence actor stopped");
}

fn handle_put(
    manager: &mut TableManager,
    self_tx: &Sender<PersistRequest>,
    entries: Vec<(String, String)>,
) -> Result<()> {
    for (key, value) in &entries {
        manager.put(key, value)?;
        if manager.needs_roll() {
            // Fire-and-forget: the roll (and any compaction it triggers)
            // happens after this batch has replied.
            let _ = self_tx.send(PersistRequest::Seal);
        }
    }
    Ok(())
}
