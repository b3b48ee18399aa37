//! CLI commands

use anyhow::Context;
use custody_core::{Address, Amount, EventRecord, Payload, TxId, WalletEvent};
use custody_wallet::{AdminAction, LimitWindow, Receipt, Transaction};

use crate::context::AppContext;

fn print_receipt(receipt: &Receipt) {
    for record in &receipt.records {
        println!("  #{} {}", record.sequence, describe(&record.event));
    }
}

/// One-line description of an event
pub fn describe(event: &WalletEvent) -> String {
    match event {
        WalletEvent::WalletCreated {
            owners, required, ..
        } => format!("wallet created ({}-of-{})", required, owners.len()),
        WalletEvent::Submission {
            tx_id,
            destination,
            value,
            ..
        } => format!("tx {} submitted: {} to {}", tx_id, value, destination),
        WalletEvent::Confirmation { tx_id, owner } => format!("tx {} confirmed by {}", tx_id, owner),
        WalletEvent::Revocation { tx_id, owner } => format!("tx {} revoked by {}", tx_id, owner),
        WalletEvent::Execution { tx_id } => format!("tx {} executed", tx_id),
        WalletEvent::Deposit { sender, value } => format!("deposit {} from {}", value, sender),
        WalletEvent::OwnerAddition { owner } => format!("owner added: {}", owner),
        WalletEvent::OwnerRemoval { owner } => format!("owner removed: {}", owner),
        WalletEvent::OwnerReplacement { old, new } => format!("owner replaced: {} -> {}", old, new),
        WalletEvent::GuardianAddition { guardian } => format!("guardian added: {}", guardian),
        WalletEvent::GuardianRemoval { guardian } => format!("guardian removed: {}", guardian),
        WalletEvent::RequirementChange { required } => format!("requirement changed to {}", required),
        WalletEvent::DailyLimitChange { limit } => format!("daily limit set to {}", limit),
        WalletEvent::WeeklyLimitChange { limit } => format!("weekly limit set to {}", limit),
        WalletEvent::TimeLockChange { period_secs } => format!("time lock set to {}s", period_secs),
        WalletEvent::Paused => "wallet paused".to_string(),
        WalletEvent::Unpaused => "wallet unpaused".to_string(),
    }
}

/// Submit a transaction
pub fn submit(
    ctx: &AppContext,
    caller: Address,
    destination: Address,
    value: Amount,
    payload: Payload,
) -> Result<(), anyhow::Error> {
    let receipt = ctx
        .handle()
        .command(|w| w.submit_transaction(caller, destination, value, payload))?;

    let id = receipt.tx_id.context("submission did not assign an id")?;
    println!("✅ Submitted transaction {}", id);
    print_receipt(&receipt);
    Ok(())
}

/// Submit a self-call carrying an administrative action
pub fn propose(ctx: &AppContext, caller: Address, action: AdminAction) -> Result<(), anyhow::Error> {
    let payload = action.encode()?;
    let wallet = ctx.handle().query(|w| w.address());
    let receipt = ctx
        .handle()
        .command(|w| w.submit_transaction(caller, wallet, Amount::ZERO, payload))?;

    let id = receipt.tx_id.context("submission did not assign an id")?;
    println!("✅ Proposed {} as transaction {}", action.operation(), id);
    print_receipt(&receipt);
    Ok(())
}

pub fn confirm(ctx: &AppContext, caller: Address, id: TxId) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.confirm_transaction(caller, id))?;
    println!("✅ Confirmed transaction {}", id);
    print_receipt(&receipt);
    Ok(())
}

pub fn revoke(ctx: &AppContext, caller: Address, id: TxId) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.revoke_confirmation(caller, id))?;
    println!("✅ Revoked confirmation of transaction {}", id);
    print_receipt(&receipt);
    Ok(())
}

pub fn execute(ctx: &AppContext, caller: Address, id: TxId) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.execute_transaction(caller, id))?;
    println!("✅ Executed transaction {}", id);
    print_receipt(&receipt);
    Ok(())
}

pub fn batch_confirm(ctx: &AppContext, caller: Address, ids: &[TxId]) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.batch_confirmation(caller, ids))?;
    println!("✅ Confirmed {} transactions", ids.len());
    print_receipt(&receipt);
    Ok(())
}

pub fn batch_execute(ctx: &AppContext, caller: Address, ids: &[TxId]) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.batch_execution(caller, ids))?;
    println!("✅ Executed {} transactions", ids.len());
    print_receipt(&receipt);
    Ok(())
}

/// Apply an administrative action directly
pub fn admin(ctx: &AppContext, caller: Address, action: AdminAction) -> Result<(), anyhow::Error> {
    let operation = action.operation();
    let receipt = ctx.handle().command(|w| w.admin(caller, action))?;
    println!("✅ {}", operation);
    print_receipt(&receipt);
    Ok(())
}

pub fn pause(ctx: &AppContext, caller: Address) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.pause(caller))?;
    println!("⏸️  Wallet paused");
    print_receipt(&receipt);
    Ok(())
}

pub fn unpause(ctx: &AppContext, caller: Address) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.unpause(caller))?;
    println!("▶️  Wallet unpaused");
    print_receipt(&receipt);
    Ok(())
}

pub fn deposit(ctx: &AppContext, sender: Address, value: Amount) -> Result<(), anyhow::Error> {
    let receipt = ctx.handle().command(|w| w.deposit(sender, value))?;
    let balance = ctx.handle().query(|w| w.balance());
    println!("✅ Deposited {} (balance: {})", value, balance);
    print_receipt(&receipt);
    Ok(())
}

/// Print the wallet summary
pub fn status(ctx: &AppContext) -> Result<(), anyhow::Error> {
    ctx.handle().query(|w| {
        println!("=== Wallet {} ===", w.address());
        println!("Status:      {}", if w.is_paused() { "PAUSED" } else { "running" });
        println!("Threshold:   {}-of-{}", w.required(), w.owners().len());
        println!("Balance:     {}", w.balance());
        println!("Time lock:   {}s", w.time_lock_period());

        for window in [LimitWindow::Daily, LimitWindow::Weekly] {
            let limit = w.limit(window);
            if limit.is_zero() {
                println!("{:<12} uncapped (spent {})", format!("{}:", window), w.spent(window));
            } else {
                println!(
                    "{:<12} {} / {} (remaining {})",
                    format!("{}:", window),
                    w.spent(window),
                    limit,
                    w.remaining(window).unwrap_or(Amount::ZERO)
                );
            }
        }

        println!("\nOwners:");
        for owner in w.owners() {
            println!("  {}", owner);
        }
        if !w.guardians().is_empty() {
            println!("Guardians:");
            for guardian in w.guardians() {
                println!("  {}", guardian);
            }
        }
        println!("\nTransactions: {} (journal seq {})", w.transaction_count(), w.last_sequence());
    });
    Ok(())
}

fn print_transaction(tx: &Transaction, status: &str, unlocks_at: Option<String>) {
    println!("=== Transaction {} [{}] ===", tx.id, status);
    println!("Destination: {}", tx.destination);
    println!("Value:       {}", tx.value);
    println!("Payload:     {}", tx.payload);
    println!("Submitted:   {} by {}", tx.submitted_at.to_rfc3339(), tx.submitter);
    println!("Confirmations ({}):", tx.confirmation_count());
    for owner in &tx.confirmations {
        println!("  {}", owner);
    }
    if let Some(unlocks_at) = unlocks_at {
        println!("Unlocks at:  {}", unlocks_at);
    }
    if let Some(executed_at) = tx.executed_at {
        println!("Executed:    {}", executed_at.to_rfc3339());
    }
}

/// Show one transaction
pub fn show(ctx: &AppContext, id: TxId) -> Result<(), anyhow::Error> {
    ctx.handle().query(|w| -> Result<(), anyhow::Error> {
        let tx = w.transaction(id)?;
        let status = w.status(id)?;
        let unlocks_at = w.unlocks_at(id)?.map(|at| at.to_rfc3339());
        print_transaction(tx, &status.to_string(), unlocks_at);
        Ok(())
    })
}

/// List transaction ids in `[from, to)`
pub fn list(
    ctx: &AppContext,
    from: TxId,
    to: Option<TxId>,
    pending: bool,
    executed: bool,
) -> Result<(), anyhow::Error> {
    ctx.handle().query(|w| -> Result<(), anyhow::Error> {
        let to = to.unwrap_or(w.transaction_count() as TxId);
        let ids = w.transaction_ids(from, to, pending, executed);

        if ids.is_empty() {
            println!("No transactions");
            return Ok(());
        }

        println!("{:>6}  {:<11} {:>5}  {:>20}  DESTINATION", "ID", "STATUS", "CONF", "VALUE");
        for id in ids {
            let tx = w.transaction(id)?;
            println!(
                "{:>6}  {:<11} {:>5}  {:>20}  {}",
                id,
                w.status(id)?.to_string(),
                tx.confirmation_count(),
                tx.value.to_string(),
                tx.destination
            );
        }
        Ok(())
    })
}

fn print_records(records: &[EventRecord]) {
    for record in records {
        let caller = record
            .caller
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "#{:<5} {}  {:<44} {}",
            record.sequence,
            record.timestamp.to_rfc3339(),
            caller,
            describe(&record.event)
        );
    }
}

/// Timeline of one transaction from the journal
pub fn history(ctx: &AppContext, id: TxId) -> Result<(), anyhow::Error> {
    let records = ctx.handle().query(|w| w.history(id))?;
    println!("=== History of transaction {} ===", id);
    print_records(&records);
    Ok(())
}

/// Full journal
pub fn log(ctx: &AppContext, limit: usize) -> Result<(), anyhow::Error> {
    let records = ctx.handle().query(|w| w.records())?;
    let skip = records.len().saturating_sub(limit);
    print_records(&records[skip..]);
    Ok(())
}

/// Verify the journal chain and replay equivalence
pub fn audit(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let report = ctx.handle().query(|w| w.audit())?;

    println!("✅ Hash chain verified: {} records", report.records);
    println!("   Last sequence: {}", report.last_sequence);
    println!("   Last hash:     {}", report.last_hash);

    if !report.state_matches {
        anyhow::bail!("Replayed state does not match the live wallet");
    }
    println!("✅ Replay reproduces the live state");
    Ok(())
}
