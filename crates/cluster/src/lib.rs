//! Replication and roles for Harbor
//!
//! Two cluster topologies over the same storage engine:
//!
//! - **Primary/secondary**: node 0 starts as primary and streams every
//!   committed log entry to the secondaries' replication ports. Secondaries
//!   apply to memory only and run an election loop; when the primary dies,
//!   the lowest-id reachable secondary promotes itself (irreversibly) and
//!   starts streaming to the rest.
//! - **Masterless**: every node accepts writes, commits locally (map + WAL
//!   + snapshot) and broadcasts to all peers; inbound entries are applied
//!   map + WAL. Convergence is last-writer-wins.
//!
//! Replication is asynchronous: a primary acknowledges its client after
//! the local WAL fsync, never waiting for peers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod election;
pub mod masterless;
pub mod node;
pub mod receiver;
pub mod role;
pub mod sender;

pub use election::{ElectionConfig, ElectionHandle};
pub use masterless::{MasterlessConfig, MasterlessNode};
pub use node::{ClusterConfig, ClusterNode};
pub use receiver::ReplicationReceiver;
pub use role::{Role, RoleManager};
pub use sender::ReplicationSender;
