//! Wallet configuration
//!
//! Loaded from a JSON file at initialisation. Only `owners` and `required`
//! are mandatory; everything else falls back to a serde default.

use custody_core::{Address, Amount, WalletPolicy};
use serde::{Deserialize, Serialize};

/// Configuration for a new wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// The wallet's own address (destination of self-calls)
    #[serde(default = "default_wallet_address")]
    pub address: Address,

    /// Initial owners, in display order
    pub owners: Vec<Address>,

    /// Number of confirmations required (N in N-of-M)
    pub required: usize,

    /// Initial guardians
    #[serde(default)]
    pub guardians: Vec<Address>,

    /// Daily spending cap, `0` = uncapped
    #[serde(default)]
    pub daily_limit: Amount,

    /// Weekly spending cap, `0` = uncapped
    #[serde(default)]
    pub weekly_limit: Amount,

    /// Delay between reaching the threshold and execution
    #[serde(default)]
    pub time_lock_period_secs: u64,

    #[serde(default)]
    pub policy: WalletPolicy,

    /// Destinations that always reject transfers
    #[serde(default)]
    pub blocked_destinations: Vec<Address>,
}

fn default_wallet_address() -> Address {
    Address::derive("custody-wallet")
}

impl WalletConfig {
    /// Minimal configuration: owners and threshold, no limits, no delay
    pub fn new(owners: Vec<Address>, required: usize) -> Self {
        Self {
            address: default_wallet_address(),
            owners,
            required,
            guardians: Vec::new(),
            daily_limit: Amount::ZERO,
            weekly_limit: Amount::ZERO,
            time_lock_period_secs: 0,
            policy: WalletPolicy::default(),
            blocked_destinations: Vec::new(),
        }
    }

    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn with_time_lock(mut self, secs: u64) -> Self {
        self.time_lock_period_secs = secs;
        self
    }

    pub fn with_limits(mut self, daily: Amount, weekly: Amount) -> Self {
        self.daily_limit = daily;
        self.weekly_limit = weekly;
        self
    }

    pub fn with_guardians(mut self, guardians: Vec<Address>) -> Self {
        self.guardians = guardians;
        self
    }

    pub fn with_policy(mut self, policy: WalletPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let alice = Address::derive("alice");
        let json = format!(r#"{{ "owners": ["{}"], "required": 1 }}"#, alice);
        let config: WalletConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config.owners, vec![alice]);
        assert_eq!(config.required, 1);
        assert_eq!(config.address, default_wallet_address());
        assert!(config.daily_limit.is_zero());
        assert_eq!(config.time_lock_period_secs, 0);
        assert!(!config.policy.guardians_can_pause);
    }

    #[test]
    fn test_missing_owners_rejected() {
        let result = serde_json::from_str::<WalletConfig>(r#"{ "required": 1 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");
        let config = WalletConfig::new(vec![Address::derive("alice")], 1)
            .with_limits(Amount::new(10), Amount::new(100))
            .with_time_lock(3600);
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = WalletConfig::from_file(&path).unwrap();
        assert_eq!(loaded.daily_limit, Amount::new(10));
        assert_eq!(loaded.weekly_limit, Amount::new(100));
        assert_eq!(loaded.time_lock_period_secs, 3600);
    }

    #[test]
    fn test_from_file_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wallet.json");
        std::fs::write(&path, "not json").unwrap();

        let err = WalletConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
