//! Integration tests for the custody service
//!
//! These tests drive the wallet through the shared handle with a real
//! on-disk journal and verify restart replay, subscribers and concurrency.

use chrono::{TimeZone, Utc};
use custody_core::{verify_chain, Address, Amount, Payload, WalletEvent};
use custody_events::EventReader;
use custody_rpc::{AppContext, ContextError};
use custody_wallet::{ManualClock, WalletConfig, WalletError};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast::error::TryRecvError;

fn addr(label: &str) -> Address {
    Address::derive(label)
}

fn owners(n: usize) -> Vec<Address> {
    (0..n).map(|i| addr(&format!("owner-{}", i))).collect()
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 7, 1, 9, 30, 0).unwrap()))
}

/// Test: Init → Deposit → Submit → Confirm → Execute → Restart
#[tokio::test]
async fn test_full_workflow_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let clock = clock();
    let owners = owners(3);
    let config = WalletConfig::new(owners.clone(), 2).with_limits(Amount::new(1_000), Amount::ZERO);

    let ctx = AppContext::init_with_clock(temp_dir.path(), &config, clock.clone()).unwrap();
    let handle = ctx.handle().clone();

    handle.command(|w| w.deposit(addr("funder"), Amount::new(500))).unwrap();
    let id = handle
        .command(|w| w.submit_transaction(owners[0], addr("payee"), Amount::new(200), Payload::empty()))
        .unwrap()
        .tx_id
        .unwrap();
    handle.command(|w| w.confirm_transaction(owners[1], id)).unwrap();
    handle.command(|w| w.execute_transaction(owners[2], id)).unwrap();

    let snapshot = handle.query(|w| w.state().clone());
    assert_eq!(handle.query(|w| w.balance()), Amount::new(300));

    drop(handle);
    drop(ctx);

    let reopened = AppContext::open_with_clock(temp_dir.path(), clock).unwrap();
    let handle = reopened.handle();
    assert_eq!(handle.query(|w| w.state().clone()), snapshot);
    assert_eq!(handle.query(|w| w.last_sequence()), 6);
    assert!(handle.query(|w| w.audit()).unwrap().state_matches);

    // Journal on disk is a valid hash chain
    let records = EventReader::from_directory(reopened.journal_path())
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(records.len(), 6);
    assert!(verify_chain(&records).is_ok());
}

#[tokio::test]
async fn test_open_and_init_guards() {
    let temp_dir = TempDir::new().unwrap();
    let config = WalletConfig::new(owners(2), 1);

    assert!(matches!(
        AppContext::open(temp_dir.path()),
        Err(ContextError::NotInitialized(_))
    ));

    let ctx = AppContext::init(temp_dir.path(), &config).unwrap();
    drop(ctx);

    assert!(matches!(
        AppContext::init(temp_dir.path(), &config),
        Err(ContextError::AlreadyInitialized(_))
    ));
    assert!(AppContext::open(temp_dir.path()).is_ok());
}

#[tokio::test]
async fn test_blocked_destinations_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let clock = clock();
    let owners = owners(1);
    let mut config = WalletConfig::new(owners.clone(), 1);
    config.blocked_destinations = vec![addr("sanctioned")];

    let ctx = AppContext::init_with_clock(temp_dir.path(), &config, clock.clone()).unwrap();
    ctx.handle()
        .command(|w| w.deposit(addr("funder"), Amount::new(10)))
        .unwrap();
    drop(ctx);

    let ctx = AppContext::open_with_clock(temp_dir.path(), clock).unwrap();
    let handle = ctx.handle();
    let id = handle
        .command(|w| w.submit_transaction(owners[0], addr("sanctioned"), Amount::new(1), Payload::empty()))
        .unwrap()
        .tx_id
        .unwrap();

    let result = handle.command(|w| w.execute_transaction(owners[0], id));
    assert!(matches!(result, Err(WalletError::TransferFailed { .. })));
    assert_eq!(handle.query(|w| w.balance()), Amount::new(10));
}

#[tokio::test]
async fn test_subscribers_receive_committed_records() {
    let temp_dir = TempDir::new().unwrap();
    let owners = owners(2);
    let config = WalletConfig::new(owners.clone(), 2);

    let ctx = AppContext::init_with_clock(temp_dir.path(), &config, clock()).unwrap();
    let handle = ctx.handle().clone();
    let mut rx = handle.subscribe();

    handle
        .command(|w| w.submit_transaction(owners[0], addr("payee"), Amount::ZERO, Payload::empty()))
        .unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(matches!(first.event, WalletEvent::Submission { tx_id: 0, .. }));
    assert!(matches!(second.event, WalletEvent::Confirmation { tx_id: 0, .. }));
    assert_eq!(second.sequence, first.sequence + 1);

    // Rejected commands publish nothing
    let result = handle.command(|w| w.execute_transaction(owners[0], 0));
    assert!(matches!(result, Err(WalletError::InsufficientConfirmations { .. })));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_concurrent_confirmations_are_serialized() {
    let temp_dir = TempDir::new().unwrap();
    let owners = owners(5);
    let config = WalletConfig::new(owners.clone(), 5);

    let ctx = AppContext::init_with_clock(temp_dir.path(), &config, clock()).unwrap();
    let handle = ctx.handle().clone();

    let id = handle
        .command(|w| w.submit_transaction(owners[0], addr("payee"), Amount::ZERO, Payload::empty()))
        .unwrap()
        .tx_id
        .unwrap();

    let mut tasks = Vec::new();
    for owner in owners.iter().skip(1).copied() {
        let handle = handle.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            handle.command(|w| w.confirm_transaction(owner, id))
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(handle.query(|w| w.confirmation_count(id)).unwrap(), 5);
    handle.command(|w| w.execute_transaction(owners[4], id)).unwrap();

    let records = handle.query(|w| w.records()).unwrap();
    assert!(verify_chain(&records).is_ok());
    assert_eq!(records.len(), 8);
}

#[tokio::test]
async fn test_pause_through_handle() {
    let temp_dir = TempDir::new().unwrap();
    let owners = owners(2);
    let config = WalletConfig::new(owners.clone(), 1);

    let ctx = AppContext::init_with_clock(temp_dir.path(), &config, clock()).unwrap();
    let handle = ctx.handle();

    handle.command(|w| w.pause(owners[1])).unwrap();
    assert!(handle.query(|w| w.is_paused()));

    let result = handle.command(|w| {
        w.submit_transaction(owners[0], addr("payee"), Amount::ZERO, Payload::empty())
    });
    assert!(matches!(result, Err(WalletError::SystemPaused { .. })));

    handle.command(|w| w.unpause(owners[0])).unwrap();
    assert!(!handle.query(|w| w.is_paused()));
}
