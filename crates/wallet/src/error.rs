//! Wallet errors

use chrono::{DateTime, Utc};
use custody_core::{Address, Amount, TxId};
use custody_events::EventError;
use thiserror::Error;

use crate::limits::LimitWindow;

/// Errors from the authorization engine
///
/// Every variant names the operation or transaction it concerns so callers
/// can render a precise message.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("{operation}: {caller} is not authorized")]
    Unauthorized {
        operation: &'static str,
        caller: Address,
    },

    #[error("{operation}: wallet is paused")]
    SystemPaused { operation: &'static str },

    #[error("unpause: wallet is not paused")]
    NotPaused,

    #[error("Transaction {0} not found")]
    NotFound(TxId),

    #[error("Transaction {0} already executed")]
    AlreadyExecuted(TxId),

    #[error("Transaction {id} already confirmed by {owner}")]
    AlreadyConfirmed { id: TxId, owner: Address },

    #[error("Transaction {id} not confirmed by {owner}")]
    NotConfirmed { id: TxId, owner: Address },

    #[error("Transaction {id} has {have} confirmations, {need} required")]
    InsufficientConfirmations { id: TxId, have: usize, need: usize },

    #[error("Transaction {id} is time locked until {unlocks_at}")]
    TimeLockNotElapsed { id: TxId, unlocks_at: DateTime<Utc> },

    #[error("Transaction {id}: {window} limit {limit} exceeded (spent {spent}, value {value})")]
    LimitExceeded {
        id: TxId,
        window: LimitWindow,
        limit: Amount,
        spent: Amount,
        value: Amount,
    },

    #[error("Removing an owner would leave {owners} owners for requirement {required}")]
    ThresholdViolation { required: usize, owners: usize },

    #[error("Invalid requirement {required} for {owners} owners")]
    InvalidRequirement { required: usize, owners: usize },

    #[error("{operation}: null identity is not allowed")]
    InvalidIdentity { operation: &'static str },

    #[error("{0} is already an owner")]
    AlreadyOwner(Address),

    #[error("{0} is not an owner")]
    NotOwner(Address),

    #[error("{0} is already a guardian")]
    AlreadyGuardian(Address),

    #[error("{0} is not a guardian")]
    NotGuardian(Address),

    #[error("{operation}: amount must be greater than zero")]
    InvalidAmount { operation: &'static str },

    #[error("Transaction {id} transfer failed: {reason}")]
    TransferFailed { id: TxId, reason: String },

    #[error("Journal has no wallet creation record")]
    NotInitialized,

    #[error("Journal already contains a wallet")]
    AlreadyInitialized,

    #[error("Journal error: {0}")]
    Journal(#[from] EventError),
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
