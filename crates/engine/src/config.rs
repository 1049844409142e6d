//! Engine configuration
//!
//! Controls where a node persists its state, the snapshot fault-injection
//! probability, and whether the value indexes are maintained.

use harbor_durability::{DataPaths, SNAPSHOT_FILENAME, WAL_FILENAME};
use std::path::PathBuf;

/// Storage engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Data directory holding the WAL and snapshot
    pub data_dir: PathBuf,
    /// WAL filename inside the data directory
    pub wal_filename: String,
    /// Snapshot filename inside the data directory
    pub snapshot_filename: String,
    /// Probability that a `sim_fail` snapshot write is skipped (test-only)
    pub snapshot_skip_chance: f64,
    /// Whether to maintain the full-text and similarity indexes
    pub enable_indexes: bool,
}

impl EngineConfig {
    /// Configuration for a node persisting under `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        EngineConfig {
            data_dir: data_dir.into(),
            wal_filename: WAL_FILENAME.to_string(),
            snapshot_filename: SNAPSHOT_FILENAME.to_string(),
            snapshot_skip_chance: 0.0,
            enable_indexes: false,
        }
    }

    /// Set the snapshot skip probability
    pub fn with_snapshot_skip_chance(mut self, chance: f64) -> Self {
        self.snapshot_skip_chance = chance;
        self
    }

    /// Enable or disable the value indexes
    pub fn with_indexes(mut self, enabled: bool) -> Self {
        self.enable_indexes = enabled;
        self
    }

    /// Override the persisted filenames
    pub fn with_filenames(
        mut self,
        wal_filename: impl Into<String>,
        snapshot_filename: impl Into<String>,
    ) -> Self {
        self.wal_filename = wal_filename.into();
        self.snapshot_filename = snapshot_filename.into();
        self
    }

    /// Resolve the file layout for this configuration
    pub fn paths(&self) -> DataPaths {
        DataPaths::with_filenames(&self.data_dir, &self.wal_filename, &self.snapshot_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new("/tmp/data");
        assert_eq!(config.wal_filename, "wal.jsonl");
        assert_eq!(config.snapshot_filename, "snapshot.json");
        assert_eq!(config.snapshot_skip_chance, 0.0);
        assert!(!config.enable_indexes);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new("/tmp/data")
            .with_snapshot_skip_chance(0.5)
            .with_indexes(true)
            .with_filenames("log.jsonl", "state.json");
        assert_eq!(config.snapshot_skip_chance, 0.5);
        assert!(config.enable_indexes);
        assert!(config.paths().wal().ends_with("log.jsonl"));
    }
}
