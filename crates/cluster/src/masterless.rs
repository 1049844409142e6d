//! Masterless cluster node
//!
//! No roles: every node accepts reads and writes. A write commits locally
//! (map + WAL + snapshot) and is then broadcast to all peers; inbound
//! entries are applied map + WAL, because each node is authoritative for
//! its own durability; losing any node must not lose writes that were
//! routed through it. Nodes converge last-writer-wins per key.

use crate::receiver::ReplicationReceiver;
use crate::sender::ReplicationSender;
use harbor_core::{LogEntry, Result};
use harbor_engine::{EngineConfig, KvEngine, ReplicaDurability};
use harbor_server::RequestHandler;
use harbor_wire::{Request, Response};
use parking_lot::Mutex;
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_TOP_K: usize = 10;

/// Configuration of one masterless node
#[derive(Debug, Clone)]
pub struct MasterlessConfig {
    /// This node's identifier (logging only; no role derives from it)
    pub node_id: u32,
    /// Replication port this node listens on
    pub repl_addr: SocketAddr,
    /// The other nodes' replication endpoints
    pub peer_repl_addrs: Vec<SocketAddr>,
    /// This node's data directory
    pub data_dir: PathBuf,
}

/// One node of a masterless cluster
pub struct MasterlessNode {
    config: MasterlessConfig,
    engine: Arc<KvEngine>,
    receiver: Mutex<Option<ReplicationReceiver>>,
    broadcaster: Arc<ReplicationSender>,
}

impl MasterlessNode {
    /// Open the engine and bind the replication listener
    ///
    /// Peers are not dialed yet; call `connect_peers` once the other
    /// nodes' listeners are up (a peer dialed too early is dropped for
    /// this node's life, like any other dial failure).
    pub fn start(config: MasterlessConfig) -> Result<Arc<Self>> {
        let engine = Arc::new(KvEngine::open(EngineConfig::new(&config.data_dir))?);
        let receiver = ReplicationReceiver::start(
            config.repl_addr,
            Arc::clone(&engine),
            ReplicaDurability::MapAndWal,
        )?;
        info!(node_id = config.node_id, "masterless node started");
        Ok(Arc::new(MasterlessNode {
            engine,
            receiver: Mutex::new(Some(receiver)),
            broadcaster: Arc::new(ReplicationSender::new()),
            config,
        }))
    }

    /// Dial the configured peer replication endpoints
    pub fn connect_peers(&self) {
        self.broadcaster.dial(&self.config.peer_repl_addrs);
    }

    /// The node's storage engine
    pub fn engine(&self) -> &Arc<KvEngine> {
        &self.engine
    }

    /// Number of peers in the live broadcast set
    pub fn live_peers(&self) -> usize {
        self.broadcaster.live_peers()
    }

    /// Shut down replication
    pub fn stop(&self) {
        if let Some(receiver) = self.receiver.lock().take() {
            receiver.stop();
        }
        self.broadcaster.close();
        info!(node_id = self.config.node_id, "masterless node stopped");
    }

    /// Commit locally, then broadcast; acknowledgement follows the local
    /// WAL fsync, never the peers
    fn apply_and_broadcast(&self, entry: LogEntry, sim_fail: bool) -> Result<()> {
        self.engine.commit(&entry, sim_fail)?;
        self.broadcaster.broadcast(&entry);
        Ok(())
    }

    fn mutate(&self, entry: LogEntry, sim_fail: bool) -> Response {
        match self.apply_and_broadcast(entry, sim_fail) {
            Ok(()) => Response::ok(),
            Err(err) => {
                warn!(error = %err, "mutation failed");
                Response::error(err.to_string())
            }
        }
    }
}

impl RequestHandler for MasterlessNode {
    fn handle(&self, request: &Request) -> Response {
        let sim_fail = request.debug_simulate_fail;
        match request.method.as_str() {
            "get" => match &request.key {
                None => Response::missing_key(),
                Some(key) => Response::with_optional_value(self.engine.get(key)),
            },
            "set" => match &request.key {
                None => Response::missing_key(),
                Some(key) => {
                    let value = request.value.clone().unwrap_or(json!(null));
                    self.mutate(LogEntry::set(key.clone(), value), sim_fail)
                }
            },
            "delete" => match &request.key {
                None => Response::missing_key(),
                Some(key) => self.mutate(LogEntry::delete(key.clone()), sim_fail),
            },
            "bulk_set" => {
                if request.items.is_empty() {
                    return Response::ok();
                }
                self.mutate(LogEntry::bulk(request.items.clone()), sim_fail)
            }
            "search" => {
                let query = request.query.as_deref().unwrap_or_default();
                Response::with_value(json!(self.engine.search(query)))
            }
            "search_similar" => {
                let query = request.query.as_deref().unwrap_or_default();
                let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
                Response::with_value(json!(self.engine.search_similar(query, top_k)))
            }
            // `role` included: masterless nodes have no roles.
            other => Response::unknown_method(other),
        }
    }
}
