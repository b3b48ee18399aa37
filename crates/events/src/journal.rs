//! Journal abstraction used by the wallet engine
//!
//! A commit appends all of its records in one call. If the append fails the
//! engine discards the commit, so implementations must not report success
//! for partially written batches they can detect.

use crate::error::EventError;
use crate::reader::EventReader;
use crate::store::EventStore;
use custody_core::EventRecord;

/// Durable, ordered record sink
pub trait Journal: Send + Sync {
    /// Append the records of one commit
    fn append(&mut self, records: &[EventRecord]) -> Result<(), EventError>;

    /// Read every record in sequence order
    fn records(&self) -> Result<Vec<EventRecord>, EventError>;
}

/// In-memory journal (for testing and ephemeral wallets)
#[derive(Debug, Default)]
pub struct MemoryJournal {
    records: Vec<EventRecord>,
    fail_appends: bool,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing records (e.g. a copy of another journal)
    pub fn with_records(records: Vec<EventRecord>) -> Self {
        Self {
            records,
            fail_appends: false,
        }
    }

    /// Make every following append fail with an IO error
    pub fn fail_appends(&mut self, fail: bool) {
        self.fail_appends = fail;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Journal for MemoryJournal {
    fn append(&mut self, records: &[EventRecord]) -> Result<(), EventError> {
        if self.fail_appends {
            return Err(EventError::Io(std::io::Error::other("journal unavailable")));
        }
        self.records.extend_from_slice(records);
        Ok(())
    }

    fn records(&self) -> Result<Vec<EventRecord>, EventError> {
        Ok(self.records.clone())
    }
}

impl Journal for EventStore {
    fn append(&mut self, records: &[EventRecord]) -> Result<(), EventError> {
        self.append_all(records)
    }

    fn records(&self) -> Result<Vec<EventRecord>, EventError> {
        EventReader::from_directory(self.base_path())?.read_all()
    }
}
