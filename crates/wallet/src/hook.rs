//! Transfer hooks - destination accept/reject decisions
//!
//! Hooks run before an execution commits. If any hook rejects, the execution
//! fails with `TransferFailed` and nothing is applied. Hooks only decide; they
//! must not move value themselves.

use custody_core::{Address, Amount, TxId};
use std::sync::Arc;

/// An outgoing transfer awaiting a decision
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    pub tx_id: TxId,
    pub destination: Address,
    pub value: Amount,
    pub payload: &'a [u8],
}

/// Decision from a transfer hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferDecision {
    Accept,
    Reject { reason: String },
}

impl TransferDecision {
    pub fn reject(reason: impl Into<String>) -> Self {
        TransferDecision::Reject {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, TransferDecision::Accept)
    }
}

pub trait TransferHook: Send + Sync {
    /// Hook name for logging
    fn name(&self) -> &str;

    /// Priority (lower = runs first)
    fn priority(&self) -> u32 {
        100
    }

    fn on_transfer(&self, transfer: &Transfer<'_>) -> TransferDecision;
}

/// Rejects transfers to a fixed set of destinations
pub struct DenyListHook {
    blocked: Vec<Address>,
}

impl DenyListHook {
    pub fn new(blocked: Vec<Address>) -> Self {
        Self { blocked }
    }
}

impl TransferHook for DenyListHook {
    fn name(&self) -> &str {
        "DenyList"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn on_transfer(&self, transfer: &Transfer<'_>) -> TransferDecision {
        if self.blocked.contains(&transfer.destination) {
            TransferDecision::reject(format!("destination {} rejects transfers", transfer.destination))
        } else {
            TransferDecision::Accept
        }
    }
}

/// Ordered set of hooks
#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn TransferHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn TransferHook>) {
        self.hooks.push(hook);
        self.hooks.sort_by_key(|h| h.priority());
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// First rejection wins; accept when every hook accepts
    pub fn run(&self, transfer: &Transfer<'_>) -> TransferDecision {
        for hook in &self.hooks {
            match hook.on_transfer(transfer) {
                TransferDecision::Accept => {
                    tracing::debug!(hook = hook.name(), tx_id = transfer.tx_id, "Transfer hook accepted");
                }
                TransferDecision::Reject { reason } => {
                    tracing::warn!(
                        hook = hook.name(),
                        tx_id = transfer.tx_id,
                        reason = %reason,
                        "Transfer hook rejected"
                    );
                    return TransferDecision::Reject { reason };
                }
            }
        }

        TransferDecision::Accept
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectAll;

    impl TransferHook for RejectAll {
        fn name(&self) -> &str {
            "RejectAll"
        }

        fn on_transfer(&self, _transfer: &Transfer<'_>) -> TransferDecision {
            TransferDecision::reject("closed")
        }
    }

    fn transfer(destination: Address) -> Transfer<'static> {
        Transfer {
            tx_id: 0,
            destination,
            value: Amount::new(1),
            payload: &[],
        }
    }

    #[test]
    fn test_empty_registry_accepts() {
        let registry = HookRegistry::new();
        assert!(registry.run(&transfer(Address::derive("d"))).is_accepted());
    }

    #[test]
    fn test_deny_list() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(DenyListHook::new(vec![Address::derive("blocked")])));

        assert!(registry.run(&transfer(Address::derive("d"))).is_accepted());
        assert!(!registry.run(&transfer(Address::derive("blocked"))).is_accepted());
    }

    #[test]
    fn test_priority_order() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(RejectAll));
        registry.register(Arc::new(DenyListHook::new(vec![Address::derive("blocked")])));

        // DenyList (priority 10) runs before RejectAll (100)
        let decision = registry.run(&transfer(Address::derive("blocked")));
        match decision {
            TransferDecision::Reject { reason } => assert!(reason.contains("rejects transfers")),
            TransferDecision::Accept => panic!("expected rejection"),
        }
        assert_eq!(registry.len(), 2);
    }
}
