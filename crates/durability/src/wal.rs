//! Append-only write-ahead log
//!
//! One `LogEntry` JSON line per append. The append path is flush + fsync
//! before returning: once `append` is `Ok`, the record survives process and
//! OS crash. There is no batching; the engine trades throughput for the
//! guarantee that acknowledgement implies durability.
//!
//! The reader side is deliberately tolerant: the first malformed or
//! truncated line ends replay. A record torn mid-line never partially
//! applies, which is what makes `bulk` records atomic across crashes.

use harbor_core::{LogEntry, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writer half of the WAL
///
/// Owned exclusively by the storage engine and serialized by the engine
/// guard; this type itself performs no locking.
pub struct WalWriter {
    path: PathBuf,
    file: File,
}

impl WalWriter {
    /// Open or create the log in append mode
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "opened WAL for appending");
        Ok(WalWriter { path, file })
    }

    /// Append one record and fsync it to stable storage
    ///
    /// The record is recoverable once this returns `Ok`.
    pub fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let line = entry.to_json_line()?;
        self.file.write_all(line.as_bytes())?;
        self.file.sync_all()?;
        debug!(bytes = line.len(), "WAL append synced");
        Ok(())
    }

    /// Reset the log to empty
    ///
    /// Used once per promotion: a newly promoted primary rebases its
    /// durable state (fresh snapshot) and restarts the authoritative log.
    pub fn truncate(&mut self) -> Result<()> {
        self.file.set_len(0)?;
        self.file.sync_all()?;
        info!(path = %self.path.display(), "WAL truncated");
        Ok(())
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every decodable record from a WAL file, top to bottom
///
/// - Absent file: empty log.
/// - Blank lines: skipped.
/// - First malformed or truncated line: replay stops there, silently. A
///   partially written trailing record is discarded whole.
pub fn read_wal_entries(path: &Path) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            // Unreadable bytes mid-file are treated like a torn tail.
            Err(err) => {
                warn!(error = %err, "WAL read stopped mid-file");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match LogEntry::from_json_line(&line) {
            Ok(entry) => entries.push(entry),
            Err(_) => {
                debug!(at_entry = entries.len(), "discarding torn WAL tail");
                break;
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn wal_path(dir: &TempDir) -> PathBuf {
        dir.path().join("wal.jsonl")
    }

    #[test]
    fn test_append_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut writer = WalWriter::open(&path).unwrap();
        writer.append(&LogEntry::set("a", json!(1))).unwrap();
        writer.append(&LogEntry::delete("a")).unwrap();
        writer
            .append(&LogEntry::bulk(vec![
                ("b".to_string(), json!(2)),
                ("c".to_string(), json!("three")),
            ]))
            .unwrap();

        let entries = read_wal_entries(&path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], LogEntry::set("a", json!(1)));
        assert_eq!(entries[1], LogEntry::delete("a"));
    }

    #[test]
    fn test_reopen_appends_after_existing_records() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut writer = WalWriter::open(&path).unwrap();
        writer.append(&LogEntry::set("a", json!(1))).unwrap();
        drop(writer);

        let mut writer = WalWriter::open(&path).unwrap();
        writer.append(&LogEntry::set("b", json!(2))).unwrap();

        let entries = read_wal_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_absent_file_is_empty_log() {
        let dir = TempDir::new().unwrap();
        assert!(read_wal_entries(&wal_path(&dir)).unwrap().is_empty());
    }

    #[test]
    fn test_torn_tail_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut writer = WalWriter::open(&path).unwrap();
        writer.append(&LogEntry::set("a", json!(1))).unwrap();
        writer.append(&LogEntry::set("b", json!(2))).unwrap();
        drop(writer);

        // Simulate a crash mid-append: half a record, no newline.
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(br#"{"op":"set","key":"c","va"#).unwrap();
        drop(file);

        let entries = read_wal_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], LogEntry::set("b", json!(2)));
    }

    #[test]
    fn test_torn_bulk_drops_whole_record() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut writer = WalWriter::open(&path).unwrap();
        writer.append(&LogEntry::set("a", json!(1))).unwrap();
        drop(writer);

        let bulk = LogEntry::bulk(vec![
            ("x".to_string(), json!(1)),
            ("y".to_string(), json!(2)),
        ])
        .to_json_line()
        .unwrap();
        // Cut inside the second pair: the first pair is fully on disk, the
        // record still must not apply at all.
        let cut = bulk.len() - 6;
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(bulk[..cut].as_bytes()).unwrap();
        drop(file);

        let entries = read_wal_entries(&path).unwrap();
        assert_eq!(entries, vec![LogEntry::set("a", json!(1))]);
    }

    #[test]
    fn test_garbage_mid_file_stops_replay() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut file = File::create(&path).unwrap();
        file.write_all(b"{\"op\":\"set\",\"key\":\"a\",\"value\":1}\n")
            .unwrap();
        file.write_all(b"not json at all\n").unwrap();
        file.write_all(b"{\"op\":\"set\",\"key\":\"b\",\"value\":2}\n")
            .unwrap();
        drop(file);

        // Everything after the bad line is ignored, matching replay's
        // end-of-log contract.
        let entries = read_wal_entries(&path).unwrap();
        assert_eq!(entries, vec![LogEntry::set("a", json!(1))]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut file = File::create(&path).unwrap();
        file.write_all(b"\n{\"op\":\"set\",\"key\":\"a\",\"value\":1}\n\n")
            .unwrap();
        drop(file);

        assert_eq!(read_wal_entries(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_truncate_resets_log() {
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut writer = WalWriter::open(&path).unwrap();
        writer.append(&LogEntry::set("a", json!(1))).unwrap();
        writer.truncate().unwrap();
        writer.append(&LogEntry::set("b", json!(2))).unwrap();

        let entries = read_wal_entries(&path).unwrap();
        assert_eq!(entries, vec![LogEntry::set("b", json!(2))]);
    }

    #[test]
    fn test_final_line_without_newline_still_replays() {
        // Line-boundary contract: a complete JSON record whose newline was
        // lost is still one whole record.
        let dir = TempDir::new().unwrap();
        let path = wal_path(&dir);

        let mut file = File::create(&path).unwrap();
        file.write_all(b"{\"op\":\"set\",\"key\":\"a\",\"value\":1}")
            .unwrap();
        drop(file);

        assert_eq!(
            read_wal_entries(&path).unwrap(),
            vec![LogEntry::set("a", json!(1))]
        );
    }
}
