//! Shared wallet handle - the serialization boundary
//!
//! One writer at a time: every command holds the write lock for its whole
//! duration, queries take the read lock and only ever see committed state.
//! Committed records are published to subscribers after the lock is released.

use custody_core::EventRecord;
use custody_wallet::{Receipt, Wallet, WalletResult};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the committed-record channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Cloneable handle to a single wallet
#[derive(Clone)]
pub struct WalletHandle {
    wallet: Arc<RwLock<Wallet>>,
    events: broadcast::Sender<EventRecord>,
}

impl WalletHandle {
    pub fn new(wallet: Wallet) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            wallet: Arc::new(RwLock::new(wallet)),
            events,
        }
    }

    /// Run a mutating command under the write lock.
    ///
    /// On success the committed records are broadcast in order.
    pub fn command<F>(&self, f: F) -> WalletResult<Receipt>
    where
        F: FnOnce(&mut Wallet) -> WalletResult<Receipt>,
    {
        let receipt = {
            let mut wallet = self.wallet.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut wallet)?
        };

        for record in &receipt.records {
            // No subscribers is not an error
            let _ = self.events.send(record.clone());
        }
        debug!(
            records = receipt.records.len(),
            subscribers = self.events.receiver_count(),
            "Published committed records"
        );

        Ok(receipt)
    }

    /// Read committed state under the read lock
    pub fn query<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Wallet) -> T,
    {
        let wallet = self.wallet.read().unwrap_or_else(PoisonError::into_inner);
        f(&wallet)
    }

    /// Receive every record committed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletHandle")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}
