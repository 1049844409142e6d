//! The guarded mutation path
//!
//! One `parking_lot::Mutex` protects the map, the WAL, the snapshot file
//! and the indexes. Every mutation holds it across the full
//! apply -> WAL -> snapshot -> index sequence; readers take the same lock.
//! Consequences:
//!
//! - WAL order is a total order consistent with acknowledgement order.
//! - No reader ever observes a partially applied bulk.
//! - The lock is held across fsync; throughput is one fsync per operation.
//!   The design trades throughput for crash safety.
//!
//! The WAL append is the line of acknowledgement: once it returns, the
//! operation is durable regardless of what happens to the snapshot.

use crate::config::EngineConfig;
use harbor_core::{LogEntry, Result, Value};
use harbor_durability::{recover, DataPaths, SnapshotWriter, WalWriter};
use harbor_search::ValueIndexes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, info};

/// What an inbound-replication apply persists locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaDurability {
    /// Apply to the in-memory map only (primary/secondary topology: the
    /// authoritative log lives on the primary)
    MapOnly,
    /// Apply to the map and append the local WAL (masterless topology:
    /// every node is authoritative for its own durability)
    MapAndWal,
}

struct EngineInner {
    map: HashMap<String, Value>,
    wal: WalWriter,
    snapshot: SnapshotWriter,
    indexes: Option<ValueIndexes>,
}

impl EngineInner {
    /// Map + index application for one record. Runs under the guard.
    fn apply(&mut self, entry: &LogEntry) {
        entry.apply_to(&mut self.map);
        let Some(indexes) = &self.indexes else {
            return;
        };
        match entry {
            LogEntry::Set { key, value } => indexes.index(key, value),
            LogEntry::Delete { key } => indexes.forget(key),
            LogEntry::Bulk { items } => {
                for (key, value) in items {
                    indexes.index(key, value);
                }
            }
        }
    }
}

/// Durable key-value storage engine
///
/// Construction runs recovery (snapshot + WAL replay) and rebuilds the
/// indexes from the recovered map. Safe to share across threads behind an
/// `Arc`; all state lives behind the engine guard.
pub struct KvEngine {
    inner: Mutex<EngineInner>,
    paths: DataPaths,
}

impl KvEngine {
    /// Open (or create) the engine over a data directory
    pub fn open(config: EngineConfig) -> Result<Self> {
        let paths = config.paths();
        paths.ensure_dir()?;

        let recovered = recover(&paths)?;
        let indexes = config.enable_indexes.then(|| {
            let indexes = ValueIndexes::new();
            indexes.rebuild(&recovered.map);
            indexes
        });

        let wal = WalWriter::open(paths.wal())?;
        let snapshot = SnapshotWriter::new(paths.snapshot(), config.snapshot_skip_chance);

        info!(
            data_dir = %paths.data_dir().display(),
            keys = recovered.map.len(),
            entries_replayed = recovered.entries_replayed,
            indexes = config.enable_indexes,
            "engine opened"
        );

        Ok(KvEngine {
            inner: Mutex::new(EngineInner {
                map: recovered.map,
                wal,
                snapshot,
                indexes,
            }),
            paths,
        })
    }

    /// Current value for `key`, deep-copied; `None` when absent
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().map.get(key).cloned()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    /// Upsert one pair; durable once this returns
    pub fn set(&self, key: impl Into<String>, value: Value, sim_fail: bool) -> Result<()> {
        self.commit(&LogEntry::set(key, value), sim_fail)
    }

    /// Remove one pair
    ///
    /// An absent key is still appended to the WAL (replication ordering)
    /// and acknowledged as success.
    pub fn delete(&self, key: impl Into<String>, sim_fail: bool) -> Result<()> {
        self.commit(&LogEntry::delete(key), sim_fail)
    }

    /// Apply all pairs atomically: either the full list becomes durable or
    /// none of it does. An empty list succeeds without a WAL record.
    pub fn bulk_set(&self, items: Vec<(String, Value)>, sim_fail: bool) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        self.commit(&LogEntry::bulk(items), sim_fail)
    }

    /// Run the mutation protocol for one record
    ///
    /// Under the guard: (1) apply to map and indexes, (2) WAL append +
    /// fsync, (3) snapshot write + fsync (skippable via `sim_fail`). The
    /// record is the caller's to broadcast afterwards; replication happens
    /// outside the guard, once the local apply is durable.
    pub fn commit(&self, entry: &LogEntry, sim_fail: bool) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.apply(entry);
        let EngineInner {
            map, wal, snapshot, ..
        } = &mut *inner;
        wal.append(entry)?;
        snapshot.write(map, sim_fail)?;
        debug!(keys = entry.keys().len(), "mutation committed");
        Ok(())
    }

    /// Apply a record received from a peer
    ///
    /// Map and indexes always; the local WAL only in masterless mode.
    /// Never writes a snapshot; replicas snapshot on their own mutations.
    pub fn apply_replicated(
        &self,
        entry: &LogEntry,
        durability: ReplicaDurability,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.apply(entry);
        if durability == ReplicaDurability::MapAndWal {
            inner.wal.append(entry)?;
        }
        Ok(())
    }

    /// Rebase durable state onto the current map
    ///
    /// Writes a fresh snapshot and truncates the WAL, making the files
    /// equivalent to the in-memory state. Called once when a secondary is
    /// promoted: its authoritative log is reborn from this point.
    pub fn rebase(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let EngineInner {
            map, wal, snapshot, ..
        } = &mut *inner;
        snapshot.write(map, false)?;
        wal.truncate()?;
        info!(keys = map.len(), "durable state rebased onto live map");
        Ok(())
    }

    /// Keys whose value contains every token of the query
    ///
    /// Empty result when the indexes are disabled.
    pub fn search(&self, query: &str) -> Vec<String> {
        let inner = self.inner.lock();
        match &inner.indexes {
            Some(indexes) => indexes.search(query),
            None => Vec::new(),
        }
    }

    /// Top-k `(key, score)` pairs by value similarity to the query
    ///
    /// Empty result when the indexes are disabled.
    pub fn search_similar(&self, query: &str, top_k: usize) -> Vec<(String, f64)> {
        let inner = self.inner.lock();
        match &inner.indexes {
            Some(indexes) => indexes.search_similar(query, top_k),
            None => Vec::new(),
        }
    }

    /// File layout this engine persists to
    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }
}
