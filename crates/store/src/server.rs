//! TCP ingress.
//!
//! The accept loop runs on the caller's thread and dispatches connections
//! to a fixed pool of router workers over a bounded channel. Each worker
//! owns a [`Router`] clone and handles one connection at a time.
//!
//! ## Protocol
//!
//! One request per line, one response line per request:
//!
//! ```text
//! PUT {"newKeys":[{"key":"k","value":["a","b"]}]}   →  OK keys accepted
//! GET {"keys":["k","missing"]}                      →  {"value":[["a","b"],[]]}
//! QUIT                                              →  (closes the connection)
//! ```
//!
//! Any failure is reported as `ERR <reason>` and the connection stays
//! open.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{bounded, Receiver, Sender};

use crate::config::Config;
use crate::router::{GetRequest, PutRequest, Router};

/// Message sent to router workers.
enum WorkerMessage {
    /// New client connection to handle.
    Connection(TcpStream),
    /// Signal to exit.
    Shutdown,
}

/// TCP server for ShoalKV.
///
/// ## Architecture
/// - The thread calling [`Server::run`] accepts connections
/// - A pool of `router_instances` workers handles client I/O
/// - Every worker dispatches through its own `Router` clone
pub struct Server {
    config: Config,
    router: Router,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Binds the listen address from the config. The listener is
    /// non-blocking so the accept loop can poll the shutdown flag.
    pub fn bind(config: Config, router: Router) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .with_context(|| format!("binding {}", config.listen_addr))?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            router,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The bound address, useful when the config asked for port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// A flag that stops the accept loop when set.
    #[must_use]
    pub fn shutdown_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Serves until the shutdown switch flips, then drains the worker
    /// pool.
    pub fn run(self) -> Result<()> {
        tracing::info!(addr = %self.listener.local_addr()?, "server listening");

        let workers = self.config.router_instances.max(1);
        let (dispatch, incoming) = bounded::<WorkerMessage>(self.config.max_connections);

        tracing::info!(workers, "starting router workers");
        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let worker = RouterWorker {
                id: worker_id,
                incoming: incoming.clone(),
                router: self.router.clone(),
                shutdown: Arc::clone(&self.shutdown),
                active_connections: Arc::clone(&self.active_connections),
            };
            let handle = thread::Builder::new()
                .name(format!("shoalkv-router-{worker_id}"))
                .spawn(move || worker.run())
                .context("spawning router worker")?;
            handles.push(handle);
        }

        self.accept_loop(&dispatch);

        tracing::info!("shutting down server");
        for _ in &handles {
            let _ = dispatch.send(WorkerMessage::Shutdown);
        }
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("router worker panicked");
            }
        }
        tracing::info!("server stopped");
        Ok(())
    }

    fn accept_loop(&self, dispatch: &Sender<WorkerMessage>) {
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let current = self.active_connections.load(Ordering::Relaxed);
                    if current >= self.config.max_connections {
                        tracing::warn!(
                            current,
                            limit = self.config.max_connections,
                            peer = %addr,
                            "connection limit reached, rejecting"
                        );
                        drop(stream);
                        continue;
                    }

                    tracing::debug!(peer = %addr, "accepted connection");
                    if dispatch.send(WorkerMessage::Connection(stream)).is_err() {
                        tracing::error!("worker pool is gone, stopping accept loop");
                        return;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        tracing::error!(error = %e, "accept failed");
                    }
                }
            }
        }
    }
}

/// Worker thread that handles client connections.
struct RouterWorker {
    id: usize,
    incoming: Receiver<WorkerMessage>,
    router: Router,
    shutdown: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
}

impl RouterWorker {
    fn run(self) {
        tracing::debug!(worker = self.id, "router worker started");

        loop {
            match self.incoming.recv() {
                Ok(WorkerMessage::Connection(stream)) => self.handle_connection(stream),
                Ok(WorkerMessage::Shutdown) | Err(_) => break,
            }
        }

        tracing::debug!(worker = self.id, "router worker stopped");
    }

    fn handle_connection(&self, stream: TcpStream) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = serve_connection(&self.router, stream, &self.shutdown) {
            tracing::debug!(worker = self.id, error = %e, "connection ended with error");
        }

        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Reads request lines until EOF, `QUIT`, or server shutdown, writing one
/// response line per request.
///
/// Reads use a short timeout so an idle connection re-checks the shutdown
/// flag instead of pinning its worker forever. Bytes of a partially read
/// line accumulate across timeouts.
fn serve_connection(router: &Router, stream: TcpStream, shutdown: &AtomicBool) -> Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_millis(500)))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    loop {
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let request = line.trim();
                if request.eq_ignore_ascii_case("QUIT") {
                    break;
                }
                if !request.is_empty() {
                    let response = handle_request(router, request);
                    writer.write_all(response.as_bytes())?;
                    writer.write_all(b"\n")?;
                    writer.flush()?;
                }
                line.clear();
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::Interrupted
                ) =>
            {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Dispatches one request line and renders the response line.
fn handle_request(router: &Router, line: &str) -> String {
    let (op, body) = match line.split_once(' ') {
        Some((op, body)) => (op, body.trim()),
        None => (line, ""),
    };

    if op.eq_ignore_ascii_case("PUT") {
        match serde_json::from_str::<PutRequest>(body) {
            Ok(request) => match router.put(request) {
                Ok(()) => "OK keys added to cache and sstable storage".to_string(),
                Err(e) => format!("ERR {e:#}"),
            },
            Err(e) => format!("ERR bad PUT body: {e}"),
        }
    } else if op.eq_ignore_ascii_case("GET") {
        match serde_json::from_str::<GetRequest>(body) {
            Ok(request) => match router.get(&request) {
                Ok(response) => serde_json::to_string(&response)
                    .unwrap_or_else(|e| format!("ERR encoding response: {e}")),
                Err(e) => format!("ERR {e:#}"),
            },
            Err(e) => format!("ERR bad GET body: {e}"),
        }
    } else {
        format!("ERR unknown command {op:?} (expected PUT, GET, or QUIT)")
    }
}
