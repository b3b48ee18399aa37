//! Application context - wires the journal, clock and wallet together
//!
//! Data directory layout:
//!
//! ```text
//! <data>/
//! ├── config.json          # configuration the wallet was created with
//! └── journal/
//!     └── YYYY-MM-DD.jsonl # hash-chained event records
//! ```

use custody_events::{EventError, EventReader, EventStore};
use custody_wallet::{Clock, SystemClock, Wallet, WalletConfig, WalletError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::handle::WalletHandle;

const CONFIG_FILE: &str = "config.json";
const JOURNAL_DIR: &str = "journal";

/// Application context
pub struct AppContext {
    handle: WalletHandle,
    data_path: PathBuf,
    journal_path: PathBuf,
}

impl AppContext {
    /// Create a new wallet in `data_path`
    pub fn init(data_path: impl AsRef<Path>, config: &WalletConfig) -> Result<Self, ContextError> {
        Self::init_with_clock(data_path, config, Arc::new(SystemClock))
    }

    pub fn init_with_clock(
        data_path: impl AsRef<Path>,
        config: &WalletConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ContextError> {
        let data_path = data_path.as_ref().to_path_buf();
        let journal_path = data_path.join(JOURNAL_DIR);

        if has_records(&journal_path)? {
            return Err(ContextError::AlreadyInitialized(data_path));
        }
        std::fs::create_dir_all(&journal_path)?;

        let store = EventStore::new(&journal_path)?;
        let wallet = Wallet::create(config, clock, Box::new(store))?;

        let config_json = serde_json::to_string_pretty(config)?;
        std::fs::write(data_path.join(CONFIG_FILE), config_json)?;

        info!(path = %data_path.display(), "Initialized wallet data directory");

        Ok(Self {
            handle: WalletHandle::new(wallet),
            data_path,
            journal_path,
        })
    }

    /// Open an existing wallet, replaying its journal
    pub fn open(data_path: impl AsRef<Path>) -> Result<Self, ContextError> {
        Self::open_with_clock(data_path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(data_path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self, ContextError> {
        let data_path = data_path.as_ref().to_path_buf();
        let journal_path = data_path.join(JOURNAL_DIR);

        if !has_records(&journal_path)? {
            return Err(ContextError::NotInitialized(data_path));
        }

        let config = WalletConfig::from_file(&data_path.join(CONFIG_FILE))?;
        let store = EventStore::new(&journal_path)?;
        let wallet = Wallet::open(&config, clock, Box::new(store))?;

        Ok(Self {
            handle: WalletHandle::new(wallet),
            data_path,
            journal_path,
        })
    }

    pub fn handle(&self) -> &WalletHandle {
        &self.handle
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }
}

fn has_records(journal_path: &Path) -> Result<bool, ContextError> {
    if !journal_path.exists() {
        return Ok(false);
    }
    Ok(EventReader::from_directory(journal_path)?.count()? > 0)
}

/// Errors while setting up the context
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("No wallet in {} (run `custody init` first)", .0.display())]
    NotInitialized(PathBuf),

    #[error("Wallet already initialized in {}", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config serialization error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Event store error: {0}")]
    Event(#[from] EventError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}
