//! Custody Core - Domain types
//!
//! This crate contains the fundamental types shared by every Custody crate:
//! - `Address`: 20-byte identity of owners, guardians, destinations and the wallet
//! - `Amount`: Non-negative integer value moved by the wallet
//! - `Payload`: Opaque call data carried to a destination
//! - `WalletEvent` / `EventRecord`: The journal model, hash-chained for audit

pub mod address;
pub mod amount;
pub mod event;
pub mod hash;
pub mod payload;

pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError};
pub use event::{EventRecord, TxId, WalletEvent, WalletPolicy};
pub use hash::{calculate_record_hash, verify_chain, ChainError, GENESIS_HASH};
pub use payload::{Payload, PayloadError};
