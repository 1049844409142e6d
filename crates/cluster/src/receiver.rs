//! Inbound replication: applying a peer's log stream to the local engine
//!
//! Listens on the node's dedicated replication port. Each accepted
//! connection gets its own session thread reading one log entry per line
//! and applying it through the engine's replicated-apply path. A malformed
//! or truncated line terminates that session only; the listener keeps
//! accepting new ones. Idle sessions are kept open; the read timeout only
//! paces stop-flag checks, it never tears a session down.

use harbor_core::LogEntry;
use harbor_engine::{KvEngine, ReplicaDurability};
use std::io::{BufRead, BufReader, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const ACCEPT_POLL: Duration = Duration::from_millis(100);
const SESSION_READ_POLL: Duration = Duration::from_millis(500);

/// A running inbound-replication listener
pub struct ReplicationReceiver {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
}

impl ReplicationReceiver {
    /// Bind the replication port and start accepting peer streams
    ///
    /// `durability` decides what each applied entry persists locally:
    /// map-only for a primary/secondary topology, map+WAL for masterless.
    pub fn start(
        addr: impl ToSocketAddrs,
        engine: Arc<KvEngine>,
        durability: ReplicaDurability,
    ) -> harbor_core::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));

        let accept_thread = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || accept_loop(listener, engine, durability, stop))
        };

        info!(addr = %local_addr, ?durability, "replication receiver listening");
        Ok(ReplicationReceiver {
            local_addr,
            stop,
            accept_thread: Some(accept_thread),
        })
    }

    /// The bound replication address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wind down sessions
    ///
    /// Session threads observe the flag within their read-poll interval.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
        info!(addr = %self.local_addr, "replication receiver stopped");
    }
}

impl Drop for ReplicationReceiver {
    fn drop(&mut self) {
        if self.accept_thread.is_some() {
            self.shutdown();
        }
    }
}

fn accept_loop(
    listener: TcpListener,
    engine: Arc<KvEngine>,
    durability: ReplicaDurability,
    stop: Arc<AtomicBool>,
) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!(%peer, "replication session opened");
                let engine = Arc::clone(&engine);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    session_loop(stream, &engine, durability, &stop);
                    debug!(%peer, "replication session closed");
                });
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(err) => {
                warn!(error = %err, "replication accept failed");
                thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

fn session_loop(
    stream: TcpStream,
    engine: &KvEngine,
    durability: ReplicaDurability,
    stop: &AtomicBool,
) {
    if stream.set_read_timeout(Some(SESSION_READ_POLL)).is_err() {
        return;
    }
    let mut reader = BufReader::new(stream);
    // The line buffer persists across timeouts: a timeout mid-line keeps
    // the partial bytes and the next read continues the same line.
    let mut line = String::new();
    while !stop.load(Ordering::SeqCst) {
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if !line.trim().is_empty() {
                    match LogEntry::from_json_line(&line) {
                        Ok(entry) => {
                            if let Err(err) = engine.apply_replicated(&entry, durability) {
                                warn!(error = %err, "replicated apply failed; session ends");
                                break;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "malformed replication line; session ends");
                            break;
                        }
                    }
                }
                line.clear();
            }
            Err(err)
                if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(err) => {
                debug!(error = %err, "replication session read failed");
                break;
            }
        }
    }
}
