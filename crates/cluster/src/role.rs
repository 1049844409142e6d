//! Node role state
//!
//! A node's role moves in one direction only: secondary to primary, at
//! most once per process lifetime. The flag lives behind its own small
//! lock, independent of the engine guard; mutating handlers read-check
//! it before touching the engine.

use harbor_core::Result;
use parking_lot::Mutex;
use tracing::info;

/// Snapshot of a node's role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    /// This node's identifier
    pub node_id: u32,
    /// Whether this node currently accepts mutations
    pub is_primary: bool,
}

/// Tracks whether this node is primary and owns the promotion transition
pub struct RoleManager {
    node_id: u32,
    primary: Mutex<bool>,
}

impl RoleManager {
    /// Create the role state; node 0 starts as primary
    pub fn new(node_id: u32) -> Self {
        RoleManager {
            node_id,
            primary: Mutex::new(node_id == 0),
        }
    }

    /// This node's identifier
    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    /// Whether this node is currently primary. Non-blocking, never fails.
    pub fn is_primary(&self) -> bool {
        *self.primary.lock()
    }

    /// Current role snapshot
    pub fn role(&self) -> Role {
        Role {
            node_id: self.node_id,
            is_primary: self.is_primary(),
        }
    }

    /// Become primary, running `transition` exactly once under the role lock
    ///
    /// The transition closure swaps the replication plumbing (stop inbound,
    /// start outbound). Idempotent: a node that is already primary returns
    /// `Ok(false)` without running the closure. Irreversible: there is no
    /// demotion.
    pub fn promote<F>(&self, transition: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        let mut primary = self.primary.lock();
        if *primary {
            return Ok(false);
        }
        transition()?;
        *primary = true;
        info!(node_id = self.node_id, "promoted to primary");
        Ok(true)
    }
}
