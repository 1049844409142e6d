//! Whole-state snapshot writes
//!
//! The snapshot is a single top-level JSON object mapping keys to values,
//! rewritten in place on every mutation. It is an optimization that bounds
//! recovery time, never an authority: recovery falls back to the WAL for
//! anything the snapshot missed, including torn writes.
//!
//! `skip_chance` is the test-only fsync-failure hook: when the caller opts
//! in per call (`sim_fail`) and the configured probability fires, the write
//! is skipped entirely. Durability is unaffected because the WAL append
//! already succeeded.

use harbor_core::{Result, Value};
use rand::Rng;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writer half of the snapshot file
pub struct SnapshotWriter {
    path: PathBuf,
    skip_chance: f64,
}

impl SnapshotWriter {
    /// Create a writer targeting `path`
    ///
    /// `skip_chance` is the probability that a `sim_fail` write is skipped;
    /// pass `0.0` outside tests.
    pub fn new(path: impl Into<PathBuf>, skip_chance: f64) -> Self {
        SnapshotWriter {
            path: path.into(),
            skip_chance,
        }
    }

    /// Serialize the full map, write, flush, fsync
    ///
    /// With `sim_fail` set and the configured chance firing, returns
    /// without touching the file.
    pub fn write(&self, map: &HashMap<String, Value>, sim_fail: bool) -> Result<()> {
        if sim_fail && self.skip_chance > 0.0 && rand::thread_rng().gen::<f64>() < self.skip_chance
        {
            debug!(path = %self.path.display(), "snapshot write skipped (simulated failure)");
            return Ok(());
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer(&file, map)?;
        file.sync_all()?;
        debug!(keys = map.len(), "snapshot written");
        Ok(())
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Load the snapshot map, or an empty map when there is nothing usable
///
/// Absence, unparseable content, and I/O failures all degrade to the empty
/// map; WAL replay reconstructs the rest.
pub fn load_snapshot(path: &Path) -> HashMap<String, Value> {
    if !path.exists() {
        return HashMap::new();
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "snapshot unreadable, starting empty");
            return HashMap::new();
        }
    };
    match serde_json::from_reader(file) {
        Ok(map) => map,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "snapshot unparseable, starting empty");
            HashMap::new()
        }
    }
}
