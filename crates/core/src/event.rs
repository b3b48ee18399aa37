//! Wallet events (written to the journal)
//!
//! Every committed state change is one or more `WalletEvent`s wrapped in an
//! `EventRecord`. Replaying the records in sequence order rebuilds the wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::amount::Amount;
use crate::payload::Payload;

/// Transaction sequence number, assigned at submission starting from 0
pub type TxId = u64;

/// Policy knobs fixed at wallet creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPolicy {
    /// Guardians may pause (never unpause) the wallet
    #[serde(default)]
    pub guardians_can_pause: bool,

    /// Owner and threshold changes only through executed self-calls
    #[serde(default)]
    pub quorum_for_membership: bool,
}

/// Events appended to the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// Wallet created with its initial configuration
    WalletCreated {
        wallet: Address,
        owners: Vec<Address>,
        required: usize,
        guardians: Vec<Address>,
        daily_limit: Amount,
        weekly_limit: Amount,
        time_lock_period_secs: u64,
        policy: WalletPolicy,
    },

    /// Transaction submitted
    Submission {
        tx_id: TxId,
        submitter: Address,
        destination: Address,
        value: Amount,
        payload: Payload,
    },

    /// Owner confirmed a transaction
    Confirmation { tx_id: TxId, owner: Address },

    /// Owner revoked a confirmation
    Revocation { tx_id: TxId, owner: Address },

    /// Transaction executed (value and payload delivered)
    Execution { tx_id: TxId },

    /// Inbound value received
    Deposit { sender: Address, value: Amount },

    OwnerAddition { owner: Address },

    OwnerRemoval { owner: Address },

    /// Owner replaced in place
    OwnerReplacement { old: Address, new: Address },

    GuardianAddition { guardian: Address },

    GuardianRemoval { guardian: Address },

    RequirementChange { required: usize },

    DailyLimitChange { limit: Amount },

    WeeklyLimitChange { limit: Amount },

    TimeLockChange { period_secs: u64 },

    Paused,

    Unpaused,
}

impl WalletEvent {
    /// Short event name for logs and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            WalletEvent::WalletCreated { .. } => "wallet_created",
            WalletEvent::Submission { .. } => "submission",
            WalletEvent::Confirmation { .. } => "confirmation",
            WalletEvent::Revocation { .. } => "revocation",
            WalletEvent::Execution { .. } => "execution",
            WalletEvent::Deposit { .. } => "deposit",
            WalletEvent::OwnerAddition { .. } => "owner_addition",
            WalletEvent::OwnerRemoval { .. } => "owner_removal",
            WalletEvent::OwnerReplacement { .. } => "owner_replacement",
            WalletEvent::GuardianAddition { .. } => "guardian_addition",
            WalletEvent::GuardianRemoval { .. } => "guardian_removal",
            WalletEvent::RequirementChange { .. } => "requirement_change",
            WalletEvent::DailyLimitChange { .. } => "daily_limit_change",
            WalletEvent::WeeklyLimitChange { .. } => "weekly_limit_change",
            WalletEvent::TimeLockChange { .. } => "time_lock_change",
            WalletEvent::Paused => "paused",
            WalletEvent::Unpaused => "unpaused",
        }
    }

    /// The transaction this event belongs to, if any
    pub fn tx_id(&self) -> Option<TxId> {
        match self {
            WalletEvent::Submission { tx_id, .. }
            | WalletEvent::Confirmation { tx_id, .. }
            | WalletEvent::Revocation { tx_id, .. }
            | WalletEvent::Execution { tx_id } => Some(*tx_id),
            _ => None,
        }
    }
}

/// A committed event with its position in the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the journal, starting from 1
    pub sequence: u64,

    /// Hash of the previous record (`GENESIS` for the first)
    pub prev_hash: String,

    /// SHA256 of this record's content
    pub hash: String,

    /// Commit time
    pub timestamp: DateTime<Utc>,

    /// Identity that issued the command, if any
    pub caller: Option<Address>,

    pub event: WalletEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = WalletEvent::Confirmation {
            tx_id: 3,
            owner: Address::derive("alice"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event_type\":\"confirmation\""));

        let parsed: WalletEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_unit_variant_serializes_with_tag() {
        let json = serde_json::to_string(&WalletEvent::Paused).unwrap();
        assert_eq!(json, r#"{"event_type":"paused"}"#);
    }

    #[test]
    fn test_tx_id_accessor() {
        assert_eq!(WalletEvent::Execution { tx_id: 7 }.tx_id(), Some(7));
        assert_eq!(WalletEvent::Unpaused.tx_id(), None);
        assert_eq!(WalletEvent::Unpaused.name(), "unpaused");
    }

    #[test]
    fn test_policy_defaults_when_missing() {
        let policy: WalletPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, WalletPolicy::default());
    }
}
