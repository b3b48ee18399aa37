//! # Custody Wallet
//!
//! Multi-party authorization engine for a shared custody account.
//!
//! ```text
//! submit ──► confirm ... confirm ──► threshold met (time lock starts)
//!                                         │
//!                                         ▼
//!                     time lock elapsed + within daily/weekly caps
//!                                         │
//!                                         ▼
//!                                      execute
//! ```
//!
//! ## Features
//! - N-of-M owner confirmations, revocable until execution
//! - Time lock anchored at the first time the threshold is met, never reset
//! - Daily and weekly spending caps with lazy window reset
//! - Guardians and a pause switch
//! - Self-calls: administrative actions approved through the quorum
//! - All-or-nothing batch confirm / execute
//! - Every change is a hash-chained journal record; state is rebuilt by replay

pub mod admin;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod hook;
pub mod limits;
pub mod membership;
pub mod pause;
pub mod state;
pub mod timelock;
pub mod transactions;

pub use admin::AdminAction;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WalletConfig;
pub use engine::{AuditReport, Receipt, Wallet};
pub use error::{WalletError, WalletResult};
pub use hook::{DenyListHook, HookRegistry, Transfer, TransferDecision, TransferHook};
pub use limits::{LimitWindow, SpendingLimits, SECONDS_PER_DAY, SECONDS_PER_WEEK};
pub use membership::Membership;
pub use pause::PauseSwitch;
pub use state::WalletState;
pub use timelock::TimeLock;
pub use transactions::{Transaction, TransactionLedger, TransactionStatus};
