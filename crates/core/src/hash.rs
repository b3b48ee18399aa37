//! Hash chain utilities for journal integrity

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::event::EventRecord;

/// `prev_hash` of the first record
pub const GENESIS_HASH: &str = "GENESIS";

/// Calculate SHA256 hash of record content (excluding the hash field itself)
pub fn calculate_record_hash(record: &EventRecord) -> String {
    let mut hasher = Sha256::new();

    hasher.update(record.sequence.to_le_bytes());
    hasher.update(record.prev_hash.as_bytes());
    hasher.update(record.timestamp.to_rfc3339().as_bytes());

    match record.caller {
        Some(caller) => hasher.update(caller.as_bytes()),
        None => hasher.update(b"-"),
    }

    hasher.update(format!("{:?}", record.event).as_bytes());

    hex::encode(hasher.finalize())
}

/// Verify hash chain integrity
pub fn verify_chain(records: &[EventRecord]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS_HASH.to_string();
    let mut expected_sequence = 1;

    for record in records {
        if record.sequence != expected_sequence {
            return Err(ChainError::InvalidSequence {
                expected: expected_sequence,
                actual: record.sequence,
            });
        }

        if record.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: record.sequence,
                expected: prev_hash,
                actual: record.prev_hash.clone(),
            });
        }

        let calculated = calculate_record_hash(record);
        if record.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: record.sequence,
                expected: calculated,
                actual: record.hash.clone(),
            });
        }

        prev_hash = record.hash.clone();
        expected_sequence += 1;
    }

    Ok(())
}

/// Errors in hash chain verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Sequence must be contiguous: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::amount::Amount;
    use crate::event::WalletEvent;
    use chrono::Utc;

    fn chain(events: Vec<WalletEvent>) -> Vec<EventRecord> {
        let mut prev_hash = GENESIS_HASH.to_string();
        let mut records = Vec::new();

        for (i, event) in events.into_iter().enumerate() {
            let mut record = EventRecord {
                sequence: i as u64 + 1,
                prev_hash: prev_hash.clone(),
                hash: String::new(),
                timestamp: Utc::now(),
                caller: Some(Address::derive("alice")),
                event,
            };
            record.hash = calculate_record_hash(&record);
            prev_hash = record.hash.clone();
            records.push(record);
        }

        records
    }

    fn sample_events() -> Vec<WalletEvent> {
        vec![
            WalletEvent::Deposit {
                sender: Address::derive("alice"),
                value: Amount::new(10),
            },
            WalletEvent::Paused,
            WalletEvent::Unpaused,
        ]
    }

    #[test]
    fn test_valid_chain() {
        let records = chain(sample_events());
        assert!(verify_chain(&records).is_ok());
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_tampered_event_detected() {
        let mut records = chain(sample_events());
        records[0].event = WalletEvent::Deposit {
            sender: Address::derive("alice"),
            value: Amount::new(10_000),
        };

        let result = verify_chain(&records);
        assert!(matches!(result, Err(ChainError::InvalidHash { sequence: 1, .. })));
    }

    #[test]
    fn test_missing_record_detected() {
        let mut records = chain(sample_events());
        records.remove(1);

        let result = verify_chain(&records);
        assert_eq!(
            result,
            Err(ChainError::InvalidSequence {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let records = chain(sample_events());
        assert_eq!(records[0].hash.len(), 64);
        assert_ne!(records[0].hash, records[1].hash);
    }
}
