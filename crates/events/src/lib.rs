//! Custody Events - JSONL journal
//!
//! This crate handles persistence of wallet event records to JSONL files.
//! The journal is the Source of Truth: wallet state is rebuilt by replay.

pub mod error;
pub mod journal;
pub mod reader;
pub mod store;

pub use error::EventError;
pub use journal::{Journal, MemoryJournal};
pub use reader::EventReader;
pub use store::EventStore;
