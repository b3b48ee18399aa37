//! Wallet engine - wires state, journal, clock and hooks together
//!
//! Command flow: Authorize → Pause gate → Plan → Chain → Append → Apply
//!
//! Planning runs against the current state and produces events. Nothing is
//! mutated until the whole record set is durable in the journal, so a
//! rejected command or a failed append leaves the wallet untouched.

use chrono::{DateTime, Utc};
use custody_core::{
    calculate_record_hash, verify_chain, Address, Amount, EventRecord, Payload, TxId, WalletEvent,
    WalletPolicy, GENESIS_HASH,
};
use custody_events::{EventError, Journal};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::admin::AdminAction;
use crate::clock::Clock;
use crate::config::WalletConfig;
use crate::error::{WalletError, WalletResult};
use crate::hook::{DenyListHook, HookRegistry, TransferHook};
use crate::limits::LimitWindow;
use crate::membership::Membership;
use crate::state::WalletState;
use crate::transactions::{Transaction, TransactionStatus};

/// Who may issue a command, and whether it is blocked while paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Owner,
    /// Owners, and guardians when the policy allows them to pause
    Pauser,
    /// Owners, allowed while paused
    Unpauser,
    /// Anyone, allowed while paused
    Anyone,
}

impl Access {
    fn is_gated(self) -> bool {
        matches!(self, Access::Owner | Access::Pauser)
    }
}

/// Outcome of a committed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction id assigned by a submission
    pub tx_id: Option<TxId>,

    /// Records appended to the journal, in order
    pub records: Vec<EventRecord>,
}

impl Receipt {
    pub fn events(&self) -> impl Iterator<Item = &WalletEvent> {
        self.records.iter().map(|r| &r.event)
    }
}

/// Result of comparing the journal with the live state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub records: usize,
    pub last_sequence: u64,
    pub last_hash: String,
    /// Replaying the journal reproduces the in-memory state
    pub state_matches: bool,
}

/// Multi-party custody wallet
pub struct Wallet {
    state: WalletState,
    clock: Arc<dyn Clock>,
    journal: Box<dyn Journal>,
    hooks: HookRegistry,
    last_sequence: u64,
    last_hash: String,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.state.address())
            .field("last_sequence", &self.last_sequence)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Wallet {
    /// Create a new wallet and write its genesis record
    pub fn create(
        config: &WalletConfig,
        clock: Arc<dyn Clock>,
        journal: Box<dyn Journal>,
    ) -> WalletResult<Self> {
        if !journal.records()?.is_empty() {
            return Err(WalletError::AlreadyInitialized);
        }
        if config.address.is_zero() {
            return Err(WalletError::InvalidIdentity { operation: "create" });
        }

        // Validates owners, guardians and threshold
        let membership = Membership::new(
            config.owners.clone(),
            config.required,
            config.guardians.clone(),
        )?;

        let genesis = WalletEvent::WalletCreated {
            wallet: config.address,
            owners: membership.owners().to_vec(),
            required: membership.required(),
            guardians: membership.guardians().to_vec(),
            daily_limit: config.daily_limit,
            weekly_limit: config.weekly_limit,
            time_lock_period_secs: config.time_lock_period_secs,
            policy: config.policy,
        };

        let now = clock.now();
        let state = WalletState::from_genesis(&genesis, now).ok_or(WalletError::NotInitialized)?;

        let mut wallet = Self {
            state,
            clock,
            journal,
            hooks: hooks_from_config(config),
            last_sequence: 0,
            last_hash: GENESIS_HASH.to_string(),
        };
        wallet.commit(None, now, vec![genesis])?;

        info!(
            address = %config.address,
            owners = config.owners.len(),
            required = config.required,
            "Wallet created"
        );
        Ok(wallet)
    }

    /// Rebuild a wallet from its journal
    pub fn replay(
        clock: Arc<dyn Clock>,
        journal: Box<dyn Journal>,
        hooks: HookRegistry,
    ) -> WalletResult<Self> {
        let records = journal.records()?;
        let state = rebuild(&records)?;

        let (last_sequence, last_hash) = match records.last() {
            Some(last) => (last.sequence, last.hash.clone()),
            None => return Err(WalletError::NotInitialized),
        };

        info!(
            records = records.len(),
            transactions = state.transactions().count(),
            "Wallet replayed from journal"
        );

        Ok(Self {
            state,
            clock,
            journal,
            hooks,
            last_sequence,
            last_hash,
        })
    }

    /// Replay an existing journal, or create the wallet when it is empty
    pub fn open(
        config: &WalletConfig,
        clock: Arc<dyn Clock>,
        journal: Box<dyn Journal>,
    ) -> WalletResult<Self> {
        if journal.records()?.is_empty() {
            Self::create(config, clock, journal)
        } else {
            Self::replay(clock, journal, hooks_from_config(config))
        }
    }

    /// Register a transfer hook
    pub fn register_hook(&mut self, hook: Arc<dyn TransferHook>) {
        debug!(hook = hook.name(), priority = hook.priority(), "Registered transfer hook");
        self.hooks.register(hook);
    }

    // === Transaction lifecycle ===

    /// Submit a transaction; the submitter's confirmation is recorded with it
    pub fn submit_transaction(
        &mut self,
        caller: Address,
        destination: Address,
        value: Amount,
        payload: Payload,
    ) -> WalletResult<Receipt> {
        self.run("submit_transaction", caller, Access::Owner, |wallet, _| {
            let (tx_id, events) = wallet
                .state
                .plan_submit(caller, destination, value, payload)?;
            Ok((Some(tx_id), events))
        })
    }

    pub fn confirm_transaction(&mut self, caller: Address, id: TxId) -> WalletResult<Receipt> {
        self.run("confirm_transaction", caller, Access::Owner, |wallet, _| {
            Ok((Some(id), vec![wallet.state.plan_confirm(caller, id)?]))
        })
    }

    pub fn revoke_confirmation(&mut self, caller: Address, id: TxId) -> WalletResult<Receipt> {
        self.run("revoke_confirmation", caller, Access::Owner, |wallet, _| {
            Ok((Some(id), vec![wallet.state.plan_revoke(caller, id)?]))
        })
    }

    /// Execute a transaction whose confirmations, time lock and limits allow it
    pub fn execute_transaction(&mut self, caller: Address, id: TxId) -> WalletResult<Receipt> {
        self.run("execute_transaction", caller, Access::Owner, |wallet, now| {
            Ok((Some(id), wallet.state.plan_execute(id, now, &wallet.hooks)?))
        })
    }

    /// Confirm every listed transaction, or none
    pub fn batch_confirmation(&mut self, caller: Address, ids: &[TxId]) -> WalletResult<Receipt> {
        self.run("batch_confirmation", caller, Access::Owner, |wallet, now| {
            let mut staged = wallet.state.clone();
            let mut events = Vec::with_capacity(ids.len());
            for &id in ids {
                let event = staged.plan_confirm(caller, id)?;
                staged.apply(&event, now);
                events.push(event);
            }
            Ok((None, events))
        })
    }

    /// Execute every listed transaction, or none.
    ///
    /// Each execution sees the effects of the ones before it: limits debited,
    /// balance spent, admin actions applied.
    pub fn batch_execution(&mut self, caller: Address, ids: &[TxId]) -> WalletResult<Receipt> {
        self.run("batch_execution", caller, Access::Owner, |wallet, now| {
            let mut staged = wallet.state.clone();
            let mut events = Vec::new();
            for &id in ids {
                for event in staged.plan_execute(id, now, &wallet.hooks)? {
                    staged.apply(&event, now);
                    events.push(event);
                }
            }
            Ok((None, events))
        })
    }

    // === Administration ===

    pub fn add_owner(&mut self, caller: Address, owner: Address) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::AddOwner { owner })
    }

    pub fn remove_owner(&mut self, caller: Address, owner: Address) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::RemoveOwner { owner })
    }

    pub fn replace_owner(&mut self, caller: Address, old: Address, new: Address) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::ReplaceOwner { old, new })
    }

    pub fn change_requirement(&mut self, caller: Address, required: usize) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::ChangeRequirement { required })
    }

    pub fn add_guardian(&mut self, caller: Address, guardian: Address) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::AddGuardian { guardian })
    }

    pub fn remove_guardian(&mut self, caller: Address, guardian: Address) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::RemoveGuardian { guardian })
    }

    pub fn set_daily_limit(&mut self, caller: Address, limit: Amount) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::SetDailyLimit { limit })
    }

    pub fn set_weekly_limit(&mut self, caller: Address, limit: Amount) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::SetWeeklyLimit { limit })
    }

    pub fn set_time_lock_period(&mut self, caller: Address, period_secs: u64) -> WalletResult<Receipt> {
        self.admin(caller, AdminAction::SetTimeLockPeriod { period_secs })
    }

    /// Apply an administrative action directly on an owner's authority
    pub fn admin(&mut self, caller: Address, action: AdminAction) -> WalletResult<Receipt> {
        let operation = action.operation();
        self.run(operation, caller, Access::Owner, |wallet, _| {
            if action.is_membership_change() && wallet.state.policy().quorum_for_membership {
                return Err(WalletError::Unauthorized { operation, caller });
            }
            Ok((None, vec![wallet.state.plan_admin(&action)?]))
        })
    }

    pub fn pause(&mut self, caller: Address) -> WalletResult<Receipt> {
        self.run("pause", caller, Access::Pauser, |_, _| Ok((None, vec![WalletEvent::Paused])))
    }

    pub fn unpause(&mut self, caller: Address) -> WalletResult<Receipt> {
        self.run("unpause", caller, Access::Unpauser, |wallet, _| {
            wallet.state.pause().check_unpause()?;
            Ok((None, vec![WalletEvent::Unpaused]))
        })
    }

    /// Credit inbound value; accepted from anyone, also while paused
    pub fn deposit(&mut self, sender: Address, value: Amount) -> WalletResult<Receipt> {
        self.run("deposit", sender, Access::Anyone, |wallet, _| {
            // Zero, or more than the balance can hold
            if value.is_zero() || wallet.state.balance().checked_add(&value).is_none() {
                return Err(WalletError::InvalidAmount { operation: "deposit" });
            }
            Ok((None, vec![WalletEvent::Deposit { sender, value }]))
        })
    }

    // === Pipeline ===

    fn run<F>(
        &mut self,
        operation: &'static str,
        caller: Address,
        access: Access,
        plan: F,
    ) -> WalletResult<Receipt>
    where
        F: FnOnce(&Self, DateTime<Utc>) -> WalletResult<(Option<TxId>, Vec<WalletEvent>)>,
    {
        let result = self.authorize(operation, caller, access).and_then(|()| {
            let now = self.clock.now();
            let (tx_id, events) = plan(&*self, now)?;
            let records = self.commit(Some(caller), now, events)?;
            Ok(Receipt { tx_id, records })
        });

        if let Err(ref error) = result {
            warn!(operation, %caller, %error, "Command rejected");
        }
        result
    }

    fn authorize(&self, operation: &'static str, caller: Address, access: Access) -> WalletResult<()> {
        let membership = self.state.membership();
        let allowed = match access {
            Access::Owner | Access::Unpauser => membership.is_owner(&caller),
            Access::Pauser => {
                membership.is_owner(&caller)
                    || (self.state.policy().guardians_can_pause && membership.is_guardian(&caller))
            }
            Access::Anyone => true,
        };
        if !allowed {
            return Err(WalletError::Unauthorized { operation, caller });
        }

        if access.is_gated() {
            self.state.pause().ensure_running(operation)?;
        }
        Ok(())
    }

    /// Chain, append, then apply
    fn commit(
        &mut self,
        caller: Option<Address>,
        timestamp: DateTime<Utc>,
        events: Vec<WalletEvent>,
    ) -> WalletResult<Vec<EventRecord>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut sequence = self.last_sequence;
        let mut prev_hash = self.last_hash.clone();
        let mut records = Vec::with_capacity(events.len());

        for event in events {
            sequence += 1;
            let mut record = EventRecord {
                sequence,
                prev_hash,
                hash: String::new(),
                timestamp,
                caller,
                event,
            };
            record.hash = calculate_record_hash(&record);
            prev_hash = record.hash.clone();
            records.push(record);
        }

        // Source of truth first
        self.journal.append(&records)?;

        for record in &records {
            self.state.apply(&record.event, record.timestamp);
            info!(
                sequence = record.sequence,
                event = record.event.name(),
                tx_id = ?record.event.tx_id(),
                "Event committed"
            );
        }

        self.last_sequence = sequence;
        self.last_hash = prev_hash;
        Ok(records)
    }

    // === Queries ===

    pub fn address(&self) -> Address {
        self.state.address()
    }

    pub fn policy(&self) -> WalletPolicy {
        self.state.policy()
    }

    pub fn owners(&self) -> &[Address] {
        self.state.membership().owners()
    }

    pub fn guardians(&self) -> &[Address] {
        self.state.membership().guardians()
    }

    pub fn required(&self) -> usize {
        self.state.membership().required()
    }

    pub fn is_owner(&self, id: &Address) -> bool {
        self.state.membership().is_owner(id)
    }

    pub fn is_guardian(&self, id: &Address) -> bool {
        self.state.membership().is_guardian(id)
    }

    pub fn is_paused(&self) -> bool {
        self.state.pause().is_paused()
    }

    pub fn balance(&self) -> Amount {
        self.state.balance()
    }

    pub fn limit(&self, window: LimitWindow) -> Amount {
        self.state.limits().limit(window)
    }

    /// Spent in the current window, after any reset that is due now
    pub fn spent(&self, window: LimitWindow) -> Amount {
        self.state.limits().spent(window, self.clock.now())
    }

    /// Remaining capacity now; `None` when uncapped
    pub fn remaining(&self, window: LimitWindow) -> Option<Amount> {
        self.state.limits().remaining(window, self.clock.now())
    }

    pub fn daily_limit(&self) -> Amount {
        self.limit(LimitWindow::Daily)
    }

    pub fn weekly_limit(&self) -> Amount {
        self.limit(LimitWindow::Weekly)
    }

    pub fn daily_spent(&self) -> Amount {
        self.spent(LimitWindow::Daily)
    }

    pub fn weekly_spent(&self) -> Amount {
        self.spent(LimitWindow::Weekly)
    }

    pub fn time_lock_period(&self) -> u64 {
        self.state.time_lock().period_secs()
    }

    pub fn transaction_count(&self) -> usize {
        self.state.transactions().count()
    }

    pub fn transaction(&self, id: TxId) -> WalletResult<&Transaction> {
        self.state.transactions().require(id)
    }

    pub fn confirmation_count(&self, id: TxId) -> WalletResult<usize> {
        Ok(self.transaction(id)?.confirmation_count())
    }

    pub fn confirmations(&self, id: TxId) -> WalletResult<Vec<Address>> {
        Ok(self.transaction(id)?.confirmations.clone())
    }

    pub fn is_confirmed_by(&self, id: TxId, owner: &Address) -> bool {
        self.state
            .transactions()
            .get(id)
            .is_some_and(|tx| tx.is_confirmed_by(owner))
    }

    /// Whether the transaction currently meets the threshold
    pub fn is_confirmed(&self, id: TxId) -> bool {
        self.state
            .transactions()
            .get(id)
            .is_some_and(|tx| tx.has_enough_confirmations(self.required()))
    }

    /// Ids in `[from, to)` filtered by execution state
    pub fn transaction_ids(&self, from: TxId, to: TxId, pending: bool, executed: bool) -> Vec<TxId> {
        self.state.transactions().ids(from, to, pending, executed)
    }

    pub fn status(&self, id: TxId) -> WalletResult<TransactionStatus> {
        let tx = self.transaction(id)?;
        Ok(tx.status(self.required(), self.state.time_lock(), self.clock.now()))
    }

    /// When the transaction's time lock ends; `None` until the threshold is met
    pub fn unlocks_at(&self, id: TxId) -> WalletResult<Option<DateTime<Utc>>> {
        let tx = self.transaction(id)?;
        Ok(tx.threshold_reached_at.map(|at| self.state.time_lock().unlocks_at(at)))
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    /// All journal records
    pub fn records(&self) -> WalletResult<Vec<EventRecord>> {
        Ok(self.journal.records()?)
    }

    /// Journal records concerning one transaction
    pub fn history(&self, id: TxId) -> WalletResult<Vec<EventRecord>> {
        self.transaction(id)?;
        Ok(self
            .journal
            .records()?
            .into_iter()
            .filter(|r| r.event.tx_id() == Some(id))
            .collect())
    }

    /// Verify the journal chain and check it replays to the live state
    pub fn audit(&self) -> WalletResult<AuditReport> {
        let records = self.journal.records()?;
        let replayed = rebuild(&records)?;
        let state_matches = replayed == self.state;

        if !state_matches {
            warn!(records = records.len(), "Journal replay diverges from live state");
        }

        Ok(AuditReport {
            records: records.len(),
            last_sequence: records.last().map_or(0, |r| r.sequence),
            last_hash: records
                .last()
                .map_or_else(|| GENESIS_HASH.to_string(), |r| r.hash.clone()),
            state_matches,
        })
    }
}

fn hooks_from_config(config: &WalletConfig) -> HookRegistry {
    let mut hooks = HookRegistry::new();
    if !config.blocked_destinations.is_empty() {
        hooks.register(Arc::new(DenyListHook::new(config.blocked_destinations.clone())));
    }
    hooks
}

/// Verify the chain and fold every record into a fresh state
fn rebuild(records: &[EventRecord]) -> WalletResult<WalletState> {
    verify_chain(records).map_err(EventError::from)?;

    let (first, rest) = records.split_first().ok_or(WalletError::NotInitialized)?;
    let mut state =
        WalletState::from_genesis(&first.event, first.timestamp).ok_or(WalletError::NotInitialized)?;

    for record in rest {
        state.apply(&record.event, record.timestamp);
    }
    Ok(state)
}
