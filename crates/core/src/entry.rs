//! Log records and their line codec
//!
//! Every mutation is captured as one `LogEntry`. The same record type flows
//! through the WAL, the recovery replay, and replication, serialized as a
//! self-delimiting JSON line:
//!
//! ```json
//! {"op":"set","key":"k","value":{"any":"json"}}
//! {"op":"delete","key":"k"}
//! {"op":"bulk","items":[["k1",1],["k2","two"]]}
//! ```
//!
//! Atomicity of a record rests on line-boundary integrity: either the full
//! line reached its destination or the record does not exist. Readers treat
//! a truncated or malformed line as end-of-stream.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The stored value type: any JSON-representable value.
///
/// Values are kept by deep copy; `get` hands out clones, never shared
/// references into the map.
pub type Value = serde_json::Value;

/// One durable log record. Exactly one of set / delete / bulk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum LogEntry {
    /// Upsert one pair
    Set {
        /// Key to upsert
        key: String,
        /// New value
        value: Value,
    },
    /// Remove one pair; absent key is a no-op on apply
    Delete {
        /// Key to remove
        key: String,
    },
    /// Ordered list of pairs, applied in list order, atomic as a record
    Bulk {
        /// `(key, value)` pairs; serialized as `[[key, value], ...]`
        items: Vec<(String, Value)>,
    },
}

impl LogEntry {
    /// Build a `set` record
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        LogEntry::Set {
            key: key.into(),
            value,
        }
    }

    /// Build a `delete` record
    pub fn delete(key: impl Into<String>) -> Self {
        LogEntry::Delete { key: key.into() }
    }

    /// Build a `bulk` record
    pub fn bulk(items: Vec<(String, Value)>) -> Self {
        LogEntry::Bulk { items }
    }

    /// Serialize as a single `\n`-terminated JSON line
    pub fn to_json_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one line back into a record
    ///
    /// Fails on truncated or otherwise malformed input; callers decide
    /// whether that means end-of-log (WAL replay) or end-of-session
    /// (replication).
    pub fn from_json_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    /// Apply this record to a map
    ///
    /// The single source of map semantics, shared by the engine's mutation
    /// path, recovery replay, and replication apply.
    pub fn apply_to(&self, map: &mut HashMap<String, Value>) {
        match self {
            LogEntry::Set { key, value } => {
                map.insert(key.clone(), value.clone());
            }
            LogEntry::Delete { key } => {
                map.remove(key);
            }
            LogEntry::Bulk { items } => {
                for (key, value) in items {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Keys touched by this record, in record order
    pub fn keys(&self) -> Vec<&str> {
        match self {
            LogEntry::Set { key, .. } | LogEntry::Delete { key } => vec![key.as_str()],
            LogEntry::Bulk { items } => items.iter().map(|(k, _)| k.as_str()).collect(),
        }
    }
}
