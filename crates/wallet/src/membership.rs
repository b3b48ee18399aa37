//! Membership registry - owners, guardians and the approval threshold
//!
//! Invariant: `1 <= required <= owners.len()` after every change. The
//! `check_*` methods validate a change against the current state; the
//! mutators apply an already validated change and cannot fail.

use custody_core::Address;

use crate::error::{WalletError, WalletResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    owners: Vec<Address>,
    guardians: Vec<Address>,
    required: usize,
}

impl Membership {
    /// Create a validated registry
    pub fn new(owners: Vec<Address>, required: usize, guardians: Vec<Address>) -> WalletResult<Self> {
        let mut registry = Self {
            owners: Vec::with_capacity(owners.len()),
            guardians: Vec::with_capacity(guardians.len()),
            required: 0,
        };

        for owner in owners {
            registry.check_add_owner(owner)?;
            registry.owners.push(owner);
        }
        for guardian in guardians {
            registry.check_add_guardian(guardian)?;
            registry.guardians.push(guardian);
        }

        registry.check_requirement(required)?;
        registry.required = required;

        Ok(registry)
    }

    /// Rebuild from journal contents without validation
    pub(crate) fn from_parts(owners: Vec<Address>, required: usize, guardians: Vec<Address>) -> Self {
        Self {
            owners,
            guardians,
            required,
        }
    }

    pub fn is_owner(&self, id: &Address) -> bool {
        self.owners.contains(id)
    }

    pub fn is_guardian(&self, id: &Address) -> bool {
        self.guardians.contains(id)
    }

    /// Owners in insertion order
    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn guardians(&self) -> &[Address] {
        &self.guardians
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn check_add_owner(&self, id: Address) -> WalletResult<()> {
        if id.is_zero() {
            return Err(WalletError::InvalidIdentity {
                operation: "add_owner",
            });
        }
        if self.is_owner(&id) {
            return Err(WalletError::AlreadyOwner(id));
        }
        Ok(())
    }

    pub fn check_remove_owner(&self, id: Address) -> WalletResult<()> {
        if !self.is_owner(&id) {
            return Err(WalletError::NotOwner(id));
        }
        let remaining = self.owners.len() - 1;
        if self.required > remaining {
            return Err(WalletError::ThresholdViolation {
                required: self.required,
                owners: remaining,
            });
        }
        Ok(())
    }

    pub fn check_replace_owner(&self, old: Address, new: Address) -> WalletResult<()> {
        if !self.is_owner(&old) {
            return Err(WalletError::NotOwner(old));
        }
        if new.is_zero() {
            return Err(WalletError::InvalidIdentity {
                operation: "replace_owner",
            });
        }
        if self.is_owner(&new) {
            return Err(WalletError::AlreadyOwner(new));
        }
        Ok(())
    }

    pub fn check_requirement(&self, required: usize) -> WalletResult<()> {
        if required == 0 || required > self.owners.len() {
            return Err(WalletError::InvalidRequirement {
                required,
                owners: self.owners.len(),
            });
        }
        Ok(())
    }

    pub fn check_add_guardian(&self, id: Address) -> WalletResult<()> {
        if id.is_zero() {
            return Err(WalletError::InvalidIdentity {
                operation: "add_guardian",
            });
        }
        if self.is_guardian(&id) {
            return Err(WalletError::AlreadyGuardian(id));
        }
        Ok(())
    }

    pub fn check_remove_guardian(&self, id: Address) -> WalletResult<()> {
        if !self.is_guardian(&id) {
            return Err(WalletError::NotGuardian(id));
        }
        Ok(())
    }

    pub fn add_owner(&mut self, id: Address) {
        if !self.is_owner(&id) {
            self.owners.push(id);
        }
    }

    pub fn remove_owner(&mut self, id: Address) {
        self.owners.retain(|owner| *owner != id);
    }

    /// Replace in place, keeping display position
    pub fn replace_owner(&mut self, old: Address, new: Address) {
        if let Some(slot) = self.owners.iter_mut().find(|owner| **owner == old) {
            *slot = new;
        }
    }

    pub fn set_required(&mut self, required: usize) {
        self.required = required;
    }

    pub fn add_guardian(&mut self, id: Address) {
        if !self.is_guardian(&id) {
            self.guardians.push(id);
        }
    }

    pub fn remove_guardian(&mut self, id: Address) {
        self.guardians.retain(|guardian| *guardian != id);
    }
}
