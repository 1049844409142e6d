//! Outbound replication: one primary (or masterless node) fanning log
//! entries out to its peers
//!
//! Dials every peer once per life with a bounded timeout; a peer that
//! fails to dial, or whose connection later breaks on a write, is dropped
//! from the live set and never redialed. Broadcasts are serialized by one
//! mutex so dead-peer culling cannot race a send, and never wait for any
//! peer acknowledgement.

use harbor_core::LogEntry;
use parking_lot::Mutex;
use std::io::Write;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for dialing one peer replication endpoint
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// The live set of peer replication connections
pub struct ReplicationSender {
    conns: Mutex<Vec<TcpStream>>,
}

impl Default for ReplicationSender {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplicationSender {
    /// An empty sender with no connections yet
    pub fn new() -> Self {
        ReplicationSender {
            conns: Mutex::new(Vec::new()),
        }
    }

    /// Dial every peer once; construct the live set from the successes
    pub fn connect(peers: &[SocketAddr]) -> Self {
        let sender = Self::new();
        sender.dial(peers);
        sender
    }

    /// Dial `peers` and add the successful connections to the live set
    ///
    /// Failures are dropped for this sender's life; there is no
    /// reconnection.
    pub fn dial(&self, peers: &[SocketAddr]) {
        let mut dialed = Vec::new();
        for addr in peers {
            match TcpStream::connect_timeout(addr, DIAL_TIMEOUT) {
                Ok(stream) => {
                    info!(peer = %addr, "replication peer connected");
                    dialed.push(stream);
                }
                Err(err) => {
                    warn!(peer = %addr, error = %err, "replication dial failed; peer dropped");
                }
            }
        }
        self.conns.lock().extend(dialed);
    }

    /// Send one log entry to every live peer
    ///
    /// A connection that fails mid-write is closed and culled; the other
    /// peers still receive the entry. Fire-and-forget: the
    /// caller has already made the entry locally durable.
    pub fn broadcast(&self, entry: &LogEntry) {
        let line = match entry.to_json_line() {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "unencodable log entry not broadcast");
                return;
            }
        };
        let mut conns = self.conns.lock();
        let before = conns.len();
        conns.retain_mut(|conn| {
            match conn.write_all(line.as_bytes()).and_then(|()| conn.flush()) {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "replication peer dropped on write failure");
                    false
                }
            }
        });
        debug!(peers = conns.len(), culled = before - conns.len(), "entry broadcast");
    }

    /// Number of peers currently in the live set
    pub fn live_peers(&self) -> usize {
        self.conns.lock().len()
    }

    /// Close every connection
    pub fn close(&self) {
        self.conns.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    fn dead_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    #[test]
    fn test_failed_dial_is_dropped_silently() {
        let sender = ReplicationSender::connect(&[dead_addr()]);
        assert_eq!(sender.live_peers(), 0);
        // Broadcasting to nobody is fine.
        sender.broadcast(&LogEntry::set("k", json!(1)));
    }

    #[test]
    fn test_broadcast_reaches_live_peer_as_one_line() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let peer = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            LogEntry::from_json_line(&line).unwrap()
        });

        let sender = ReplicationSender::connect(&[addr]);
        assert_eq!(sender.live_peers(), 1);
        let entry = LogEntry::bulk(vec![("a".to_string(), json!(1))]);
        sender.broadcast(&entry);

        assert_eq!(peer.join().unwrap(), entry);
    }

    #[test]
    fn test_dead_peer_culled_others_still_served() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let survivor = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut lines = Vec::new();
            for _ in 0..2 {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                lines.push(line);
            }
            lines
        });

        // A peer that accepts, then goes away.
        let dying_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let dying_addr = dying_listener.local_addr().unwrap();
        let dying = thread::spawn(move || {
            let (stream, _) = dying_listener.accept().unwrap();
            drop(stream);
        });

        let sender = ReplicationSender::connect(&[addr, dying_addr]);
        dying.join().unwrap();
        assert_eq!(sender.live_peers(), 2);

        // Writes into a freshly closed socket may take a broadcast to
        // surface the error; the survivor must see every entry.
        sender.broadcast(&LogEntry::set("first", json!(1)));
        sender.broadcast(&LogEntry::set("second", json!(2)));

        let lines = survivor.join().unwrap();
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
        assert!(sender.live_peers() <= 2);
    }
}
