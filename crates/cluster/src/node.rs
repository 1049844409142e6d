//! Primary/secondary cluster node
//!
//! Node 0 starts as primary: it dials the secondaries' replication ports
//! and streams every committed entry. Every other node starts as a
//! secondary: inbound replication applies entries to memory only (the
//! authoritative log lives on the primary) and the election loop watches
//! for the primary's death.
//!
//! On promotion the engine rebases (fresh snapshot, truncated WAL) so
//! the new primary's durable state equals its in-memory state before its
//! first own append.

use crate::election::{self, ElectionConfig, ElectionHandle};
use crate::receiver::ReplicationReceiver;
use crate::role::{Role, RoleManager};
use crate::sender::ReplicationSender;
use harbor_core::{Error, LogEntry, Result};
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

/// Configuration of one primary/secondary cluster node
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// This node's identifier; node 0 starts as primary
    pub node_id: u32,
    /// Replication port this node listens on while secondary
    pub repl_addr: SocketAddr,
    /// The other nodes' replication endpoints (dialed when primary)
    pub peer_repl_addrs: Vec<SocketAddr>,
    /// The other nodes' client endpoints (probed during elections)
    pub peer_client_addrs: Vec<SocketAddr>,
    /// This node's data directory
    pub data_dir: PathBuf,
    /// Election cadence
    pub election: ElectionConfig,
}

impl ClusterConfig {
    /// Configuration with the default election cadence
    pub fn new(
        node_id: u32,
        repl_addr: SocketAddr,
        peer_repl_addrs: Vec<SocketAddr>,
        peer_client_addrs: Vec<SocketAddr>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        ClusterConfig {
            node_id,
            repl_addr,
            peer_repl_addrs,
            peer_client_addrs,
            data_dir: data_dir.into(),
            election: ElectionConfig::default(),
        }
    }
}

struct ReplLinks {
    receiver: Option<ReplicationReceiver>,
    sender: Option<Arc<ReplicationSender>>,
}

/// One node of a primary/secondary cluster
pub struct ClusterNode {
    config: ClusterConfig,
    engine: Arc<KvEngine>,
    role: RoleManager,
    repl: Mutex<ReplLinks>,
    election: Mutex<Option<ElectionHandle>>,
}

impl ClusterNode {
    /// Open the engine and start this node's replication side
    ///
    /// Secondaries also start their election loop. The client port is not
    /// bound here; pass the returned node to `harbor_server::Server`.
    pub fn start(config: ClusterConfig) -> Result<Arc<Self>> {
        let engine = Arc::new(KvEngine::open(EngineConfig::new(&config.data_dir))?);
        let role = RoleManager::new(config.node_id);
        let node = Arc::new(ClusterNode {
            engine,
            role,
            repl: Mutex::new(ReplLinks {
                receiver: None,
                sender: None,
            }),
            election: Mutex::new(None),
            config,
        });

        if node.role.is_primary() {
            let sender = ReplicationSender::connect(&node.config.peer_repl_addrs);
            node.repl.lock().sender = Some(Arc::new(sender));
            info!(node_id = node.config.node_id, "started as primary");
        } else {
            let receiver = ReplicationReceiver::start(
                node.config.repl_addr,
                Arc::clone(&node.engine),
                ReplicaDurability::MapOnly,
            )?;
            node.repl.lock().receiver = Some(receiver);
            let handle = election::spawn(Arc::clone(&node), node.config.election.clone());
            *node.election.lock() = Some(handle);
            info!(node_id = node.config.node_id, "started as secondary");
        }
        Ok(node)
    }

    /// Current role snapshot
    pub fn role(&self) -> Role {
        self.role.role()
    }

    /// The node's storage engine
    pub fn engine(&self) -> &Arc<KvEngine> {
        &self.engine
    }

    /// Client endpoints of the other nodes, for election probes
    pub fn peer_client_addrs(&self) -> &[SocketAddr] {
        &self.config.peer_client_addrs
    }

    /// Become primary: stop inbound replication, rebase the engine, dial
    /// the secondaries
    ///
    /// Idempotent and irreversible; the whole transition runs under the
    /// role lock. Returns whether this call performed the transition.
    pub fn promote(&self) -> Result<bool> {
        self.role.promote(|| {
            let mut repl = self.repl.lock();
            if let Some(receiver) = repl.receiver.take() {
                receiver.stop();
            }
            self.engine.rebase()?;
            let sender = ReplicationSender::connect(&self.config.peer_repl_addrs);
            repl.sender = Some(Arc::new(sender));
            Ok(())
        })
    }

    /// Shut down replication and the election loop
    ///
    /// The role flag is left as-is; a stopped node answers nothing anyway.
    pub fn stop(&self) {
        if let Some(handle) = self.election.lock().take() {
            handle.stop();
        }
        let mut repl = self.repl.lock();
        if let Some(receiver) = repl.receiver.take() {
            receiver.stop();
        }
        if let Some(sender) = repl.sender.take() {
            sender.close();
        }
        info!(node_id = self.config.node_id, "cluster node stopped");
    }

    /// Commit one entry locally, then broadcast it to the live peers
    ///
    /// The role check precedes the engine guard; the broadcast happens
    /// after local durability, outside the guard.
    fn apply_and_replicate(&self, entry: LogEntry, sim_fail: bool) -> Result<()> {
        if !self.role.is_primary() {
            return Err(Error::NotPrimary);
        }
        self.engine.commit(&entry, sim_fail)?;
        let sender = self.repl.lock().sender.clone();
        if let Some(sender) = sender {
            sender.broadcast(&entry);
        }
        Ok(())
    }

    fn mutate(&self, entry: LogEntry, sim_fail: bool) -> Response {
        match self.apply_and_replicate(entry, sim_fail) {
            Ok(()) => Response::ok(),
            Err(Error::NotPrimary) => Response::not_primary(),
            Err(err) => {
                warn!(error = %err, "mutation failed");
                Response::error(err.to_string())
            }
        }
    }
}

impl RequestHandler for ClusterNode {
    fn handle(&self, request: &Request) -> Response {
        let sim_fail = request.debug_simulate_fail;
        match request.method.as_str() {
            "role" => {
                let role = self.role.role();
                Response::role(role.is_primary, role.node_id)
            }
            // Reads are served regardless of role; only mutations demand
            // the primary.
            "get" => match &request.key {
                None => Response::missing_key(),
                Some(key) => Response::with_optional_value(self.engine.get(key)),
            },
            "search" => {
                let query = request.query.as_deref().unwrap_or_default();
                Response::with_value(json!(self.engine.search(query)))
            }
            "search_similar" => {
                let query = request.query.as_deref().unwrap_or_default();
                let top_k = request.top_k.unwrap_or(DEFAULT_TOP_K);
                Response::with_value(json!(self.engine.search_similar(query, top_k)))
            }
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
                    // Success no-op: no record, nothing to broadcast. The
                    // role check still applies to keep the contract uniform.
                    if !self.role.is_primary() {
                        return Response::not_primary();
                    }
                    return Response::ok();
                }
                self.mutate(LogEntry::bulk(request.items.clone()), sim_fail)
            }
            other => Response::unknown_method(other),
        }
    }
}
