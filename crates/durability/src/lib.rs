//! Durability layer for Harbor
//!
//! This crate handles everything that touches disk:
//!
//! - Data directory layout (`wal.jsonl`, `snapshot.json`)
//! - WAL: append-only JSON-line log, fsynced before acknowledgement
//! - Snapshot: whole-state replacement write, with test-only skip injection
//! - Recovery: snapshot (if any) + WAL replay on top
//!
//! The WAL is the authoritative durability medium; the snapshot only bounds
//! recovery time. Recovery never trusts the snapshot beyond "some prefix of
//! the log's history".

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod paths;
pub mod recovery;
pub mod snapshot;
pub mod wal;

pub use paths::{DataPaths, SNAPSHOT_FILENAME, WAL_FILENAME};
pub use recovery::{recover, RecoveredState};
pub use snapshot::{load_snapshot, SnapshotWriter};
pub use wal::{read_wal_entries, WalWriter};
