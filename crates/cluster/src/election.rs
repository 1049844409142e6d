//! Failover election for secondaries
//!
//! A cooperative loop, one thread per secondary:
//!
//! 1. Idle while some other node is known to be primary locally (a
//!    promoted node never probes again).
//! 2. Each round: wait the period, settle, then probe every peer's client
//!    port with a `role` query.
//! 3. Any reachable node answering primary with a smaller id aborts the
//!    round; that node outranks us.
//! 4. Otherwise promote: the lowest reachable id wins.
//!
//! There is no quorum. Two nodes concluding promotion in the same instant
//! yields a transient multi-primary, resolved last-writer-wins by clients;
//! an accepted weakness of the scheme.

use crate::node::ClusterNode;
use harbor_wire::{roundtrip, Request};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Timing knobs for the election loop
#[derive(Debug, Clone)]
pub struct ElectionConfig {
    /// Delay between rounds
    pub period: Duration,
    /// Extra settle inside a round before probing
    pub settle: Duration,
    /// Connect/read timeout for one role probe
    pub probe_timeout: Duration,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        ElectionConfig {
            period: Duration::from_secs(1),
            settle: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(1),
        }
    }
}

/// Handle to a running election loop
pub struct ElectionHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ElectionHandle {
    /// Stop the loop and join its thread
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ElectionHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

/// Spawn the election loop for a secondary
pub fn spawn(node: Arc<ClusterNode>, config: ElectionConfig) -> ElectionHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let thread = {
        let stop = Arc::clone(&stop);
        thread::spawn(move || election_loop(&node, &config, &stop))
    };
    ElectionHandle {
        stop,
        thread: Some(thread),
    }
}

fn election_loop(node: &ClusterNode, config: &ElectionConfig, stop: &AtomicBool) {
    info!(node_id = node.role().node_id, "election loop started");
    while !stop.load(Ordering::SeqCst) {
        if !sleep_observing_stop(config.period, stop) {
            break;
        }
        if node.role().is_primary {
            // Promoted is terminal; keep idling until stopped.
            continue;
        }
        if !sleep_observing_stop(config.settle, stop) {
            break;
        }
        if node.role().is_primary {
            continue;
        }

        if lower_id_primary_reachable(node, config) {
            debug!(
                node_id = node.role().node_id,
                "lower-id primary answered; staying secondary"
            );
            continue;
        }

        match node.promote() {
            Ok(true) => {
                info!(node_id = node.role().node_id, "election won");
            }
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "promotion failed; will retry next round");
            }
        }
    }
    debug!(node_id = node.role().node_id, "election loop exiting");
}

/// Probe every peer client port; true when a reachable node outranks us
fn lower_id_primary_reachable(node: &ClusterNode, config: &ElectionConfig) -> bool {
    let my_id = node.role().node_id;
    for addr in node.peer_client_addrs() {
        let response = match roundtrip(*addr, &Request::role(), config.probe_timeout) {
            Ok(response) => response,
            // Unreachable peers simply don't vote.
            Err(_) => continue,
        };
        if response.primary == Some(true) && response.node_id.unwrap_or(u32::MAX) < my_id {
            return true;
        }
    }
    false
}

/// Sleep in short slices so the stop flag is observed promptly.
/// Returns false when stopped mid-sleep.
fn sleep_observing_stop(duration: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        thread::sleep(Duration::from_millis(50).min(duration));
    }
    !stop.load(Ordering::SeqCst)
}
