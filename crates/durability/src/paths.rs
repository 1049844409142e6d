//! On-disk layout of a node's data directory
//!
//! One directory per node, two files, no versioning header. A fresh
//! directory (both files absent) is a valid starting state.

use std::io;
use std::path::{Path, PathBuf};

/// Default WAL filename inside a data directory
pub const WAL_FILENAME: &str = "wal.jsonl";

/// Default snapshot filename inside a data directory
pub const SNAPSHOT_FILENAME: &str = "snapshot.json";

/// Resolved file locations for one node's persistent state
#[derive(Debug, Clone)]
pub struct DataPaths {
    data_dir: PathBuf,
    wal: PathBuf,
    snapshot: PathBuf,
}

impl DataPaths {
    /// Layout with the default filenames
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_filenames(data_dir, WAL_FILENAME, SNAPSHOT_FILENAME)
    }

    /// Layout with caller-chosen filenames
    pub fn with_filenames(
        data_dir: impl Into<PathBuf>,
        wal_filename: &str,
        snapshot_filename: &str,
    ) -> Self {
        let data_dir = data_dir.into();
        let wal = data_dir.join(wal_filename);
        let snapshot = data_dir.join(snapshot_filename);
        DataPaths {
            data_dir,
            wal,
            snapshot,
        }
    }

    /// Create the data directory (and parents) if missing
    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }

    /// The data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the write-ahead log
    pub fn wal(&self) -> &Path {
        &self.wal
    }

    /// Path of the snapshot file
    pub fn snapshot(&self) -> &Path {
        &self.snapshot
    }
}
