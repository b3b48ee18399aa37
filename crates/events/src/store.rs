//! JSONL event store - append-only writer

use crate::error::EventError;
use custody_core::EventRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only JSONL event store, one file per UTC day
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl EventStore {
    /// Create a new event store at the given path
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            poisoned: false,
        })
    }

    /// Append a single record
    pub fn append(&mut self, record: &EventRecord) -> Result<(), EventError> {
        self.append_all(std::slice::from_ref(record))
    }

    /// Append records that belong to one commit.
    ///
    /// Either every record lands on disk or none does: each day file gets
    /// one write, and on failure every touched file is truncated back to
    /// its previous length.
    pub fn append_all(&mut self, records: &[EventRecord]) -> Result<(), EventError> {
        if self.poisoned {
            return Err(EventError::Poisoned);
        }

        // Consecutive records of the same day share one chunk
        let mut chunks: Vec<(String, String)> = Vec::new();
        for record in records {
            let date = record.timestamp.format("%Y-%m-%d").to_string();
            let line = serde_json::to_string(record)?;
            match chunks.last_mut() {
                Some((chunk_date, chunk)) if *chunk_date == date => {
                    chunk.push_str(&line);
                    chunk.push('\n');
                }
                _ => chunks.push((date, format!("{}\n", line))),
            }
        }

        let mut touched: Vec<(PathBuf, u64)> = Vec::with_capacity(chunks.len());
        for (date, chunk) in &chunks {
            if let Err(e) = self.write_chunk(date, chunk, &mut touched) {
                tracing::warn!(error = %e, files = touched.len(), "Journal append failed, rolling back");
                self.rollback(&touched);
                return Err(e);
            }
        }

        Ok(())
    }

    fn write_chunk(
        &mut self,
        date: &str,
        chunk: &str,
        touched: &mut Vec<(PathBuf, u64)>,
    ) -> Result<(), EventError> {
        // Rotate file if date changed
        if self.current_date.as_deref() != Some(date) {
            self.rotate_file(date)?;
        }

        let path = self.file_path(date);
        let Some(ref mut writer) = self.current_file else {
            return Ok(());
        };

        // The buffer is empty between appends, so this is the length on disk
        let len = writer.get_ref().metadata()?.len();
        touched.push((path, len));

        writer.write_all(chunk.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Drop unflushed bytes and truncate touched files to their old length
    fn rollback(&mut self, touched: &[(PathBuf, u64)]) {
        if let Some(writer) = self.current_file.take() {
            let _ = writer.into_parts();
        }
        self.current_date = None;

        for (path, len) in touched {
            let result = OpenOptions::new()
                .write(true)
                .open(path)
                .and_then(|file| file.set_len(*len));
            if let Err(e) = result {
                tracing::error!(file = %path.display(), error = %e, "Journal rollback failed");
                self.poisoned = true;
            }
        }
    }

    fn file_path(&self, date: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", date))
    }

    /// Rotate to a new file for the given date
    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.file_path(date);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        tracing::debug!(file = %file_path.display(), "Rotated journal file");

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// True after a failed append that could not be undone
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Directory holding the journal files
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// List all JSONL files in the store
    pub fn list_files(&self) -> Result<Vec<PathBuf>, EventError> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::EventReader;
    use chrono::{TimeZone, Utc};
    use custody_core::{
        calculate_record_hash, Address, Amount, Payload, WalletEvent, GENESIS_HASH,
    };
    use tempfile::TempDir;

    fn record(sequence: u64, day: u32, prev_hash: &str) -> EventRecord {
        let mut record = EventRecord {
            sequence,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            caller: Some(Address::derive("alice")),
            event: WalletEvent::Deposit {
                sender: Address::derive("alice"),
                value: Amount::new(sequence as u128),
            },
        };
        record.hash = calculate_record_hash(&record);
        record
    }

    #[test]
    fn test_append_rotates_by_day() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let first = record(1, 1, GENESIS_HASH);
        let second = record(2, 2, &first.hash);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let files = store.list_files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("2026-03-01.jsonl"));
        assert!(files[1].ends_with("2026-03-02.jsonl"));
    }

    fn large_record(sequence: u64, prev_hash: &str) -> EventRecord {
        let mut record = EventRecord {
            sequence,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap(),
            caller: Some(Address::derive("alice")),
            event: WalletEvent::Submission {
                tx_id: 0,
                submitter: Address::derive("alice"),
                destination: Address::derive("payee"),
                value: Amount::ZERO,
                payload: Payload::new(vec![0xab; 10 * 1024]),
            },
        };
        record.hash = calculate_record_hash(&record);
        record
    }

    #[test]
    fn test_commit_larger_than_buffer_is_written_whole() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let first = large_record(1, GENESIS_HASH);
        let second = record(2, 5, &first.hash);
        store.append_all(&[first.clone(), second.clone()]).unwrap();

        let records = EventReader::from_directory(dir.path()).unwrap().read_all().unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn test_rollback_truncates_partial_commit() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let first = record(1, 5, GENESIS_HASH);
        store.append(&first).unwrap();
        let path = store.file_path("2026-03-05");
        let len = fs::metadata(&path).unwrap().len();

        // A commit that reached the disk only in part
        let second = large_record(2, &first.hash);
        store.append(&second).unwrap();
        store.rollback(&[(path.clone(), len)]);
        assert_eq!(fs::metadata(&path).unwrap().len(), len);
        assert!(!store.is_poisoned());

        // The next commit reuses the sequence cleanly
        let retry = record(2, 5, &first.hash);
        store.append(&retry).unwrap();
        let records = EventReader::from_directory(dir.path()).unwrap().read_all().unwrap();
        assert_eq!(records, vec![first, retry]);
    }

    #[test]
    fn test_failed_rollback_poisons_store() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        store.rollback(&[(dir.path().join("missing").join("x.jsonl"), 0)]);
        assert!(store.is_poisoned());
        assert!(matches!(
            store.append(&record(1, 5, GENESIS_HASH)),
            Err(EventError::Poisoned)
        ));
    }

    #[test]
    fn test_clock_stepping_back_across_midnight_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let first = record(1, 6, GENESIS_HASH);
        let second = record(2, 5, &first.hash);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let records = EventReader::from_directory(dir.path()).unwrap().read_all().unwrap();
        assert_eq!(records, vec![first, second]);
        assert!(custody_core::verify_chain(&records).is_ok());
    }

    #[test]
    fn test_append_all_then_read_back() {
        let dir = TempDir::new().unwrap();
        let mut store = EventStore::new(dir.path()).unwrap();

        let first = record(1, 5, GENESIS_HASH);
        let second = record(2, 5, &first.hash);
        store.append_all(&[first.clone(), second.clone()]).unwrap();
        store.close().unwrap();

        let reader = EventReader::from_directory(dir.path()).unwrap();
        let records = reader.read_all().unwrap();
        assert_eq!(records, vec![first, second]);
    }
}
