//! Transaction ledger
//!
//! Records are created on submission, never deleted, and become immutable
//! once executed (apart from their confirmation set, which can no longer be
//! revoked either).

use chrono::{DateTime, Utc};
use custody_core::{Address, Amount, Payload, TxId};
use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::error::{WalletError, WalletResult};
use crate::timelock::TimeLock;

/// Lifecycle of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Fewer confirmations than required
    Submitted,
    /// Threshold met, time lock running
    Confirmed,
    /// Threshold met and time lock elapsed
    Executable,
    /// Terminal
    Executed,
}

/// A submitted transaction and its confirmations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TxId,
    pub destination: Address,
    pub value: Amount,
    pub payload: Payload,
    pub submitter: Address,
    pub submitted_at: DateTime<Utc>,

    /// Confirming owners in confirmation order
    pub confirmations: Vec<Address>,

    /// First time the confirmation count met the requirement; never reset
    pub threshold_reached_at: Option<DateTime<Utc>>,

    pub executed: bool,
    pub executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        id: TxId,
        submitter: Address,
        destination: Address,
        value: Amount,
        payload: Payload,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            destination,
            value,
            payload,
            submitter,
            submitted_at,
            confirmations: Vec::new(),
            threshold_reached_at: None,
            executed: false,
            executed_at: None,
        }
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmations.contains(owner)
    }

    pub fn has_enough_confirmations(&self, required: usize) -> bool {
        self.confirmation_count() >= required
    }

    /// Add a confirmation (returns false if already confirmed by this owner)
    pub fn add_confirmation(&mut self, owner: Address) -> bool {
        if self.is_confirmed_by(&owner) {
            return false;
        }
        self.confirmations.push(owner);
        true
    }

    /// Remove a confirmation (returns false if it was not present)
    pub fn remove_confirmation(&mut self, owner: &Address) -> bool {
        let before = self.confirmations.len();
        self.confirmations.retain(|o| o != owner);
        self.confirmations.len() != before
    }

    /// Capture the time lock anchor the first time the threshold is met
    pub fn note_threshold(&mut self, required: usize, at: DateTime<Utc>) {
        if self.threshold_reached_at.is_none() && self.has_enough_confirmations(required) {
            self.threshold_reached_at = Some(at);
        }
    }

    pub fn status(&self, required: usize, time_lock: &TimeLock, now: DateTime<Utc>) -> TransactionStatus {
        if self.executed {
            TransactionStatus::Executed
        } else if !self.has_enough_confirmations(required) {
            TransactionStatus::Submitted
        } else if time_lock.is_elapsed(self.threshold_reached_at, now) {
            TransactionStatus::Executable
        } else {
            TransactionStatus::Confirmed
        }
    }
}

/// All transactions, indexed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLedger {
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next submission will receive
    pub fn next_id(&self) -> TxId {
        self.transactions.len() as TxId
    }

    pub fn count(&self) -> usize {
        self.transactions.len()
    }

    pub fn get(&self, id: TxId) -> Option<&Transaction> {
        usize::try_from(id).ok().and_then(|index| self.transactions.get(index))
    }

    pub fn get_mut(&mut self, id: TxId) -> Option<&mut Transaction> {
        usize::try_from(id)
            .ok()
            .and_then(move |index| self.transactions.get_mut(index))
    }

    /// Like `get`, failing with `NotFound`
    pub fn require(&self, id: TxId) -> WalletResult<&Transaction> {
        self.get(id).ok_or(WalletError::NotFound(id))
    }

    /// Append a record; ids are positional so the record must carry `next_id()`
    pub fn insert(&mut self, transaction: Transaction) {
        debug_assert_eq!(transaction.id, self.next_id());
        self.transactions.push(transaction);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    pub fn pending_mut(&mut self) -> impl Iterator<Item = &mut Transaction> {
        self.transactions.iter_mut().filter(|tx| !tx.executed)
    }

    /// Ids in `[from, to)` filtered by execution state
    pub fn ids(&self, from: TxId, to: TxId, include_pending: bool, include_executed: bool) -> Vec<TxId> {
        self.transactions
            .iter()
            .filter(|tx| tx.id >= from && tx.id < to)
            .filter(|tx| (include_pending && !tx.executed) || (include_executed && tx.executed))
            .map(|tx| tx.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
    }

    fn tx(id: TxId) -> Transaction {
        Transaction::new(
            id,
            Address::derive("alice"),
            Address::derive("dest"),
            Amount::new(5),
            Payload::empty(),
            now(),
        )
    }

    #[test]
    fn test_confirmations_are_unique() {
        let mut t = tx(0);
        assert!(t.add_confirmation(Address::derive("alice")));
        assert!(!t.add_confirmation(Address::derive("alice")));
        assert!(t.add_confirmation(Address::derive("bob")));
        assert_eq!(t.confirmation_count(), 2);

        assert!(t.remove_confirmation(&Address::derive("alice")));
        assert!(!t.remove_confirmation(&Address::derive("alice")));
        assert_eq!(t.confirmations, vec![Address::derive("bob")]);
    }

    #[test]
    fn test_threshold_anchor_is_not_reset() {
        let mut t = tx(0);
        t.add_confirmation(Address::derive("alice"));
        t.add_confirmation(Address::derive("bob"));
        t.note_threshold(2, now());

        t.remove_confirmation(&Address::derive("bob"));
        t.add_confirmation(Address::derive("carol"));
        t.note_threshold(2, now() + Duration::hours(5));

        assert_eq!(t.threshold_reached_at, Some(now()));
    }

    #[test]
    fn test_status_progression() {
        let lock = TimeLock::new(60);
        let mut t = tx(0);
        t.add_confirmation(Address::derive("alice"));
        assert_eq!(t.status(2, &lock, now()), TransactionStatus::Submitted);

        t.add_confirmation(Address::derive("bob"));
        t.note_threshold(2, now());
        assert_eq!(t.status(2, &lock, now()), TransactionStatus::Confirmed);
        assert_eq!(
            t.status(2, &lock, now() + Duration::seconds(60)),
            TransactionStatus::Executable
        );

        t.executed = true;
        assert_eq!(t.status(2, &lock, now()), TransactionStatus::Executed);
        assert_eq!(TransactionStatus::Executable.to_string(), "executable");
    }

    #[test]
    fn test_ids_filter() {
        let mut ledger = TransactionLedger::new();
        for id in 0..4 {
            ledger.insert(tx(id));
        }
        if let Some(t) = ledger.get_mut(1) {
            t.executed = true;
        }

        assert_eq!(ledger.ids(0, 4, true, false), vec![0, 2, 3]);
        assert_eq!(ledger.ids(0, 4, false, true), vec![1]);
        assert_eq!(ledger.ids(1, 3, true, true), vec![1, 2]);
        assert!(ledger.ids(0, 4, false, false).is_empty());
    }

    #[test]
    fn test_require_unknown() {
        let ledger = TransactionLedger::new();
        assert!(matches!(ledger.require(9), Err(WalletError::NotFound(9))));
        assert_eq!(ledger.next_id(), 0);
    }
}
