//! # HarborKV
//!
//! A durable, networked key-value store. One binary runs a standalone
//! server with write-ahead logging and snapshot recovery; the cluster
//! binaries run either a primary/secondary topology with failover
//! election or a masterless last-writer-wins mesh. Clients speak
//! line-delimited JSON over TCP.
//!
//! # Quick Start
//!
//! ```no_run
//! use harborkv::{EngineConfig, KvEngine};
//! use serde_json::json;
//!
//! fn main() -> harborkv::Result<()> {
//!     let engine = KvEngine::open(EngineConfig::new("./data").with_indexes(true))?;
//!
//!     engine.set("user:name", json!("Alice"), false)?;
//!     assert_eq!(engine.get("user:name"), Some(json!("Alice")));
//!
//!     // Atomic multi-key write: all of it is durable or none of it is.
//!     engine.bulk_set(
//!         vec![
//!             ("a".to_string(), json!(1)),
//!             ("b".to_string(), json!(2)),
//!         ],
//!         false,
//!     )?;
//!
//!     // Value search over the optional indexes.
//!     assert_eq!(engine.search("alice"), vec!["user:name"]);
//!     Ok(())
//! }
//! ```
//!
//! # Layout
//!
//! | Crate | Concern |
//! |-------|---------|
//! | `harbor-core` | Values, log records, line codec, errors |
//! | `harbor-durability` | WAL, snapshot, recovery |
//! | `harbor-search` | Full-text and similarity value indexes |
//! | `harbor-engine` | The guarded mutation path |
//! | `harbor-wire` | Request/response protocol |
//! | `harbor-server` | TCP listener and the standalone handler |
//! | `harbor-cluster` | Roles, replication, election, node flavors |
//! | `harbor-client` | Client library (single-server and cluster) |

pub use harbor_client::{ClusterClient, KvClient};
pub use harbor_cluster::{
    ClusterConfig, ClusterNode, ElectionConfig, MasterlessConfig, MasterlessNode, Role,
};
pub use harbor_core::{Error, LogEntry, Result, Value};
pub use harbor_engine::{EngineConfig, KvEngine, ReplicaDurability};
pub use harbor_server::{RequestHandler, Server, Standalone};
pub use harbor_wire::{Request, Response};
