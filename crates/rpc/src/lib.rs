//! Custody RPC - service handle and CLI orchestrator
//!
//! This crate provides the shared `WalletHandle`, the application context
//! that owns the on-disk journal, and the `custody` CLI binary.

pub mod commands;
pub mod context;
pub mod handle;

pub use context::{AppContext, ContextError};
pub use handle::WalletHandle;
