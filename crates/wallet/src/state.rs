//! Wallet state - the single owned value behind the engine
//!
//! State changes only through `apply`, which takes an already validated
//! event and cannot fail. The same path serves live commits and journal
//! replay, so a replayed wallet is identical to the live one.
//!
//! The `plan_*` methods validate a request against the current state and
//! return the events that would implement it. They never mutate.

use chrono::{DateTime, Utc};
use custody_core::{Address, Amount, Payload, TxId, WalletEvent, WalletPolicy};

use crate::admin::AdminAction;
use crate::error::{WalletError, WalletResult};
use crate::hook::{HookRegistry, Transfer, TransferDecision};
use crate::limits::{LimitWindow, SpendingLimits};
use crate::membership::Membership;
use crate::pause::PauseSwitch;
use crate::timelock::TimeLock;
use crate::transactions::{Transaction, TransactionLedger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletState {
    address: Address,
    policy: WalletPolicy,
    membership: Membership,
    limits: SpendingLimits,
    time_lock: TimeLock,
    pause: PauseSwitch,
    transactions: TransactionLedger,
    balance: Amount,
}

impl WalletState {
    /// Build the initial state from a `WalletCreated` event
    pub fn from_genesis(event: &WalletEvent, at: DateTime<Utc>) -> Option<Self> {
        match event {
            WalletEvent::WalletCreated {
                wallet,
                owners,
                required,
                guardians,
                daily_limit,
                weekly_limit,
                time_lock_period_secs,
                policy,
            } => Some(Self {
                address: *wallet,
                policy: *policy,
                membership: Membership::from_parts(owners.clone(), *required, guardians.clone()),
                limits: SpendingLimits::new(*daily_limit, *weekly_limit, at),
                time_lock: TimeLock::new(*time_lock_period_secs),
                pause: PauseSwitch::default(),
                transactions: TransactionLedger::new(),
                balance: Amount::ZERO,
            }),
            _ => None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn policy(&self) -> WalletPolicy {
        self.policy
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn limits(&self) -> &SpendingLimits {
        &self.limits
    }

    pub fn time_lock(&self) -> &TimeLock {
        &self.time_lock
    }

    pub fn pause(&self) -> &PauseSwitch {
        &self.pause
    }

    pub fn transactions(&self) -> &TransactionLedger {
        &self.transactions
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    /// Apply a committed event
    pub fn apply(&mut self, event: &WalletEvent, at: DateTime<Utc>) {
        match event {
            WalletEvent::WalletCreated { .. } => {}

            WalletEvent::Submission {
                tx_id,
                submitter,
                destination,
                value,
                payload,
            } => {
                self.transactions.insert(Transaction::new(
                    *tx_id,
                    *submitter,
                    *destination,
                    *value,
                    payload.clone(),
                    at,
                ));
            }

            WalletEvent::Confirmation { tx_id, owner } => {
                let required = self.membership.required();
                if let Some(tx) = self.transactions.get_mut(*tx_id) {
                    tx.add_confirmation(*owner);
                    tx.note_threshold(required, at);
                }
            }

            WalletEvent::Revocation { tx_id, owner } => {
                if let Some(tx) = self.transactions.get_mut(*tx_id) {
                    tx.remove_confirmation(owner);
                }
            }

            WalletEvent::Execution { tx_id } => {
                let Some(tx) = self.transactions.get_mut(*tx_id) else {
                    return;
                };
                tx.executed = true;
                tx.executed_at = Some(at);

                let value = tx.value;
                let to_self = tx.destination == self.address;

                self.limits.debit(value, at);
                if !to_self {
                    self.balance = self.balance.saturating_sub(&value);
                }
            }

            WalletEvent::Deposit { value, .. } => {
                self.balance = self.balance.saturating_add(value);
            }

            WalletEvent::OwnerAddition { owner } => self.membership.add_owner(*owner),
            WalletEvent::OwnerRemoval { owner } => self.membership.remove_owner(*owner),
            WalletEvent::OwnerReplacement { old, new } => self.membership.replace_owner(*old, *new),
            WalletEvent::GuardianAddition { guardian } => self.membership.add_guardian(*guardian),
            WalletEvent::GuardianRemoval { guardian } => self.membership.remove_guardian(*guardian),

            WalletEvent::RequirementChange { required } => {
                self.membership.set_required(*required);
                // Pending transactions that already meet a lowered threshold
                // start their time lock now
                for tx in self.transactions.pending_mut() {
                    tx.note_threshold(*required, at);
                }
            }

            WalletEvent::DailyLimitChange { limit } => {
                self.limits.set_limit(LimitWindow::Daily, *limit);
            }
            WalletEvent::WeeklyLimitChange { limit } => {
                self.limits.set_limit(LimitWindow::Weekly, *limit);
            }
            WalletEvent::TimeLockChange { period_secs } => self.time_lock.set_period(*period_secs),

            WalletEvent::Paused => self.pause.set(true),
            WalletEvent::Unpaused => self.pause.set(false),
        }
    }

    /// Submission plus the submitter's automatic confirmation
    pub fn plan_submit(
        &self,
        submitter: Address,
        destination: Address,
        value: Amount,
        payload: Payload,
    ) -> WalletResult<(TxId, Vec<WalletEvent>)> {
        if destination.is_zero() {
            return Err(WalletError::InvalidIdentity {
                operation: "submit_transaction",
            });
        }

        let tx_id = self.transactions.next_id();
        Ok((
            tx_id,
            vec![
                WalletEvent::Submission {
                    tx_id,
                    submitter,
                    destination,
                    value,
                    payload,
                },
                WalletEvent::Confirmation {
                    tx_id,
                    owner: submitter,
                },
            ],
        ))
    }

    pub fn plan_confirm(&self, owner: Address, id: TxId) -> WalletResult<WalletEvent> {
        let tx = self.transactions.require(id)?;
        if tx.executed {
            return Err(WalletError::AlreadyExecuted(id));
        }
        if tx.is_confirmed_by(&owner) {
            return Err(WalletError::AlreadyConfirmed { id, owner });
        }
        Ok(WalletEvent::Confirmation { tx_id: id, owner })
    }

    pub fn plan_revoke(&self, owner: Address, id: TxId) -> WalletResult<WalletEvent> {
        let tx = self.transactions.require(id)?;
        if tx.executed {
            return Err(WalletError::AlreadyExecuted(id));
        }
        if !tx.is_confirmed_by(&owner) {
            return Err(WalletError::NotConfirmed { id, owner });
        }
        Ok(WalletEvent::Revocation { tx_id: id, owner })
    }

    /// Validate an execution at `now`.
    ///
    /// Check order: existence, already executed, confirmations, time lock,
    /// spending caps, then the transfer itself (self-call action, balance,
    /// destination hooks).
    pub fn plan_execute(
        &self,
        id: TxId,
        now: DateTime<Utc>,
        hooks: &HookRegistry,
    ) -> WalletResult<Vec<WalletEvent>> {
        let tx = self.transactions.require(id)?;
        if tx.executed {
            return Err(WalletError::AlreadyExecuted(id));
        }

        let required = self.membership.required();
        if !tx.has_enough_confirmations(required) {
            return Err(WalletError::InsufficientConfirmations {
                id,
                have: tx.confirmation_count(),
                need: required,
            });
        }

        if !self.time_lock.is_elapsed(tx.threshold_reached_at, now) {
            let anchor = tx.threshold_reached_at.unwrap_or(now);
            return Err(WalletError::TimeLockNotElapsed {
                id,
                unlocks_at: self.time_lock.unlocks_at(anchor),
            });
        }

        self.limits.check_debit(id, tx.value, now)?;

        let mut events = vec![WalletEvent::Execution { tx_id: id }];

        if tx.destination == self.address {
            let action = AdminAction::decode(&tx.payload).map_err(|e| WalletError::TransferFailed {
                id,
                reason: format!("invalid admin payload: {}", e),
            })?;
            let admin_event = self.plan_admin(&action).map_err(|e| WalletError::TransferFailed {
                id,
                reason: e.to_string(),
            })?;
            events.push(admin_event);
            return Ok(events);
        }

        if tx.value > self.balance {
            return Err(WalletError::TransferFailed {
                id,
                reason: format!("insufficient balance: have {}, need {}", self.balance, tx.value),
            });
        }

        let transfer = Transfer {
            tx_id: id,
            destination: tx.destination,
            value: tx.value,
            payload: tx.payload.as_bytes(),
        };
        if let TransferDecision::Reject { reason } = hooks.run(&transfer) {
            return Err(WalletError::TransferFailed { id, reason });
        }

        Ok(events)
    }

    /// Validate an administrative action
    pub fn plan_admin(&self, action: &AdminAction) -> WalletResult<WalletEvent> {
        let membership = &self.membership;
        let event = match *action {
            AdminAction::AddOwner { owner } => {
                membership.check_add_owner(owner)?;
                WalletEvent::OwnerAddition { owner }
            }
            AdminAction::RemoveOwner { owner } => {
                membership.check_remove_owner(owner)?;
                WalletEvent::OwnerRemoval { owner }
            }
            AdminAction::ReplaceOwner { old, new } => {
                membership.check_replace_owner(old, new)?;
                WalletEvent::OwnerReplacement { old, new }
            }
            AdminAction::ChangeRequirement { required } => {
                membership.check_requirement(required)?;
                WalletEvent::RequirementChange { required }
            }
            AdminAction::AddGuardian { guardian } => {
                membership.check_add_guardian(guardian)?;
                WalletEvent::GuardianAddition { guardian }
            }
            AdminAction::RemoveGuardian { guardian } => {
                membership.check_remove_guardian(guardian)?;
                WalletEvent::GuardianRemoval { guardian }
            }
            AdminAction::SetDailyLimit { limit } => WalletEvent::DailyLimitChange { limit },
            AdminAction::SetWeeklyLimit { limit } => WalletEvent::WeeklyLimitChange { limit },
            AdminAction::SetTimeLockPeriod { period_secs } => WalletEvent::TimeLockChange { period_secs },
        };
        Ok(event)
    }
}
