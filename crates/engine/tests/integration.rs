//! Engine integration tests: atomicity, conservation, deadlock freedom,
//! ledger completeness, idempotent replay, and the audit trail.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use vaultx_core::{AccountNumber, AccountType, TransactionType};
use vaultx_engine::{AuditEvent, AuditSink, EngineError, ErrorClass, TransferEngine};
use vaultx_persistence::{LedgerRepo, Store, TransactionRow};

async fn new_engine() -> (TempDir, Arc<TransferEngine>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("bank.db")).await.unwrap();
    (dir, Arc::new(TransferEngine::new(store)))
}

async fn open_with(engine: &TransferEngine, balance: Decimal) -> String {
    engine
        .open_account("Test Customer", AccountType::Savings, balance, None)
        .await
        .unwrap()
        .account
        .account_number
        .as_str()
        .to_string()
}

#[tokio::test]
async fn open_account_writes_ledger_trail() {
    let (_dir, engine) = new_engine().await;

    let a = open_with(&engine, dec!(100.00)).await;
    assert_eq!(a, "AC-10001");
    let b = open_with(&engine, Decimal::ZERO).await;
    assert_eq!(b, "AC-10002");

    // Funded account: OPEN_ACCOUNT (amount 0) plus initial DEPOSIT
    let history = engine.history(&a).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].tx_type, TransactionType::Deposit);
    assert_eq!(history[0].amount, dec!(100.00));
    assert_eq!(history[0].description, "Initial deposit");
    assert_eq!(history[1].tx_type, TransactionType::OpenAccount);
    assert_eq!(history[1].amount, Decimal::ZERO);

    // Zero-balance account: OPEN_ACCOUNT only
    let history = engine.history(&b).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tx_type, TransactionType::OpenAccount);

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(100.00));
    assert_eq!(engine.account(&b).await.unwrap().balance, Decimal::ZERO);
}

#[tokio::test]
async fn simple_transfer_scenario() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let b = open_with(&engine, dec!(50.00)).await;
    let before = engine.ledger_count().await.unwrap();

    let receipt = engine
        .transfer(&a, &b, dec!(30.00), Some("rent"), None)
        .await
        .unwrap();

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(70.00));
    assert_eq!(engine.account(&b).await.unwrap().balance, dec!(80.00));
    assert_eq!(receipt.from_balance, Some(dec!(70.00)));
    assert_eq!(receipt.to_balance, Some(dec!(80.00)));
    assert!(!receipt.duplicate);

    // Exactly one linked OUT/IN pair, both rows carrying both accounts
    assert_eq!(engine.ledger_count().await.unwrap(), before + 2);
    let history = engine.history(&a).await.unwrap();
    let out = history
        .iter()
        .find(|r| r.tx_type == TransactionType::TransferOut)
        .unwrap();
    let inn = history
        .iter()
        .find(|r| r.tx_type == TransactionType::TransferIn)
        .unwrap();
    for record in [out, inn] {
        assert_eq!(record.amount, dec!(30.00));
        assert_eq!(record.from_account.as_ref().unwrap().as_str(), a);
        assert_eq!(record.to_account.as_ref().unwrap().as_str(), b);
    }
    assert_eq!(out.description, "rent (debit)");
    assert_eq!(inn.description, "rent (credit)");
    assert_eq!(out.id, receipt.transaction_id);
    assert_eq!(Some(inn.id.clone()), receipt.linked_transaction_id);
}

#[tokio::test]
async fn insufficient_funds_leaves_no_trace() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(10.00)).await;
    let before = engine.ledger_count().await.unwrap();

    let err = engine.withdraw(&a, dec!(50.00), Some("x"), None).await.unwrap_err();
    assert_eq!(err.code(), "insufficient-funds");
    assert_eq!(err.class(), ErrorClass::State);

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(10.00));
    assert_eq!(engine.ledger_count().await.unwrap(), before);
}

#[tokio::test]
async fn validation_errors_are_rejected_before_any_lock() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let before = engine.ledger_count().await.unwrap();

    for result in [
        engine.deposit(&a, dec!(0), None, None).await,
        engine.deposit(&a, dec!(-5.00), None, None).await,
        engine.deposit(&a, dec!(1.005), None, None).await,
        engine.transfer(&a, &a, dec!(10.00), None, None).await,
        engine.deposit("bogus", dec!(10.00), None, None).await,
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(err.code(), "invalid-input");
    }

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(100.00));
    assert_eq!(engine.ledger_count().await.unwrap(), before);
}

#[tokio::test]
async fn missing_or_closed_accounts_abort_cleanly() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let closed = open_with(&engine, Decimal::ZERO).await;
    engine.close_account(&closed).await.unwrap();
    let before = engine.ledger_count().await.unwrap();

    let err = engine
        .transfer(&a, "AC-99999", dec!(10.00), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not-found");

    let err = engine
        .transfer(&a, &closed, dec!(10.00), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "inactive-account");

    let err = engine.deposit(&closed, dec!(10.00), None, None).await.unwrap_err();
    assert_eq!(err.code(), "inactive-account");

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(100.00));
    assert_eq!(engine.ledger_count().await.unwrap(), before);
}

#[tokio::test]
async fn close_account_rules() {
    let (_dir, engine) = new_engine().await;
    let c = open_with(&engine, dec!(5.00)).await;

    // Non-zero balance: rejected, still active
    let err = engine.close_account(&c).await.unwrap_err();
    assert_eq!(err.code(), "non-zero-balance");
    assert!(engine.account(&c).await.unwrap().is_active());

    // Drain, then close
    engine.withdraw(&c, dec!(5.00), None, None).await.unwrap();
    let receipt = engine.close_account(&c).await.unwrap();
    assert_eq!(receipt.tx_type, TransactionType::CloseAccount);
    assert_eq!(receipt.amount, Decimal::ZERO);

    let account = engine.account(&c).await.unwrap();
    assert!(!account.is_active());
    assert!(account.closed_at.is_some());
    assert_eq!(account.balance, Decimal::ZERO);

    // Never resurrected
    assert!(engine.close_account(&c).await.is_err());
    assert!(engine.deposit(&c, dec!(1.00), None, None).await.is_err());
}

#[tokio::test]
async fn fault_after_debit_rolls_back_completely() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let b = open_with(&engine, dec!(50.00)).await;

    // Poison the ledger: occupy the primary key the next allocation will
    // produce, so the append fails after both balance updates succeeded.
    let count = engine.ledger_count().await.unwrap();
    let poison = TransactionRow {
        transaction_id: format!("T-{:05}", count + 1),
        tx_type: "DEPOSIT".to_string(),
        from_account: None,
        to_account: Some(a.clone()),
        amount: "1.00".to_string(),
        description: "poison".to_string(),
        idempotency_key: None,
        created_at: chrono::Utc::now(),
    };
    LedgerRepo::append(engine.store().pool(), &poison).await.unwrap();
    let before = engine.ledger_count().await.unwrap();

    let err = engine
        .transfer(&a, &b, dec!(30.00), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert_eq!(err.class(), ErrorClass::Infrastructure);

    // Full rollback: balances and ledger identical to the pre-state
    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(100.00));
    assert_eq!(engine.account(&b).await.unwrap().balance, dec!(50.00));
    assert_eq!(engine.ledger_count().await.unwrap(), before);
}

#[tokio::test]
async fn conservation_across_transfers() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(300.00)).await;
    let b = open_with(&engine, dec!(200.00)).await;
    let c = open_with(&engine, dec!(100.00)).await;
    let total = engine.total_active_balance().await.unwrap();

    let moves = [
        (&a, &b, dec!(25.00)),
        (&b, &c, dec!(110.50)),
        (&c, &a, dec!(0.50)),
        (&a, &c, dec!(99.99)),
        (&b, &a, dec!(40.00)),
    ];
    for (from, to, amount) in moves {
        engine.transfer(from, to, amount, None, None).await.unwrap();
    }

    // Transfers move value, never create or destroy it
    assert_eq!(engine.total_active_balance().await.unwrap(), total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_direction_transfers_are_deadlock_free() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(1000.00)).await;
    let b = open_with(&engine, dec!(1000.00)).await;

    let mut tasks = Vec::new();
    for i in 0..2 {
        let engine = Arc::clone(&engine);
        let (from, to) = if i == 0 {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        tasks.push(tokio::spawn(async move {
            for _ in 0..25 {
                engine
                    .transfer(&from, &to, dec!(1.00), None, None)
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        tokio::time::timeout(Duration::from_secs(60), task)
            .await
            .expect("deadlocked")
            .unwrap();
    }

    // 25 each way: net zero
    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(1000.00));
    assert_eq!(engine.account(&b).await.unwrap().balance, dec!(1000.00));
    assert_eq!(engine.total_active_balance().await.unwrap(), dec!(2000.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_disjoint_transfers_both_succeed() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let b = open_with(&engine, dec!(100.00)).await;
    let c = open_with(&engine, dec!(100.00)).await;
    let d = open_with(&engine, dec!(100.00)).await;

    let e1 = Arc::clone(&engine);
    let (a2, b2) = (a.clone(), b.clone());
    let t1 = tokio::spawn(async move { e1.transfer(&a2, &b2, dec!(10.00), None, None).await });
    let e2 = Arc::clone(&engine);
    let (c2, d2) = (c.clone(), d.clone());
    let t2 = tokio::spawn(async move { e2.transfer(&c2, &d2, dec!(20.00), None, None).await });

    t1.await.unwrap().unwrap();
    t2.await.unwrap().unwrap();

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(90.00));
    assert_eq!(engine.account(&b).await.unwrap().balance, dec!(110.00));
    assert_eq!(engine.account(&c).await.unwrap().balance, dec!(80.00));
    assert_eq!(engine.account(&d).await.unwrap().balance, dec!(120.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overdraw_never_goes_negative() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(50.00)).await;
    let b = open_with(&engine, Decimal::ZERO).await;

    // 10 concurrent withdrawals of 20.00 against 50.00: exactly 2 can win
    let mut tasks = Vec::new();
    for i in 0..10 {
        let engine = Arc::clone(&engine);
        let (a, b) = (a.clone(), b.clone());
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                engine.withdraw(&a, dec!(20.00), None, None).await
            } else {
                engine.transfer(&a, &b, dec!(20.00), None, None).await
            }
        }));
    }
    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 2);
    let balance = engine.account(&a).await.unwrap().balance;
    assert_eq!(balance, dec!(10.00));
    assert!(balance >= Decimal::ZERO);
}

#[tokio::test]
async fn idempotent_replay_returns_recorded_outcome() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let b = open_with(&engine, dec!(50.00)).await;
    let key = uuid::Uuid::new_v4().to_string();

    let first = engine
        .transfer(&a, &b, dec!(30.00), Some("rent"), Some(&key))
        .await
        .unwrap();
    assert!(!first.duplicate);
    let count = engine.ledger_count().await.unwrap();

    // Same logical submission again: no second mutation
    let replay = engine
        .transfer(&a, &b, dec!(30.00), Some("rent"), Some(&key))
        .await
        .unwrap();
    assert!(replay.duplicate);
    assert_eq!(replay.transaction_id, first.transaction_id);
    assert_eq!(replay.amount, dec!(30.00));

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(70.00));
    assert_eq!(engine.account(&b).await.unwrap().balance, dec!(80.00));
    assert_eq!(engine.ledger_count().await.unwrap(), count);

    // Distinct key: a genuinely new transfer
    let key2 = uuid::Uuid::new_v4().to_string();
    let second = engine
        .transfer(&a, &b, dec!(30.00), Some("rent"), Some(&key2))
        .await
        .unwrap();
    assert!(!second.duplicate);
    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(40.00));
}

#[tokio::test]
async fn lost_key_race_recovers_the_recorded_outcome() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;
    let number = AccountNumber::parse(&a).unwrap();

    // Hold the account lock so the submission passes its key pre-check
    // while no row exists yet, then parks before mutating.
    let guard = engine
        .locks()
        .acquire(&number, Duration::from_secs(5))
        .await
        .unwrap();

    let task = {
        let engine = Arc::clone(&engine);
        let a = a.clone();
        tokio::spawn(
            async move { engine.deposit(&a, dec!(10.00), None, Some("race-key")).await },
        )
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A competing submission with the same key commits first.
    let winner = TransactionRow {
        transaction_id: "T-90000".to_string(),
        tx_type: "DEPOSIT".to_string(),
        from_account: None,
        to_account: Some(a.clone()),
        amount: "10.00".to_string(),
        description: "Deposit".to_string(),
        idempotency_key: Some("race-key".to_string()),
        created_at: chrono::Utc::now(),
    };
    LedgerRepo::append(engine.store().pool(), &winner).await.unwrap();
    let count = engine.ledger_count().await.unwrap();

    drop(guard);
    let receipt = task.await.unwrap().unwrap();

    // The parked submission hits the unique index, rolls back, and hands
    // back the winner's receipt instead of a second mutation.
    assert!(receipt.duplicate);
    assert_eq!(receipt.transaction_id.as_str(), "T-90000");
    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(100.00));
    assert_eq!(engine.ledger_count().await.unwrap(), count);
}

#[tokio::test]
async fn idempotent_deposit_and_withdraw() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, dec!(100.00)).await;

    let deposit = engine
        .deposit(&a, dec!(10.00), None, Some("dep-key"))
        .await
        .unwrap();
    let replay = engine
        .deposit(&a, dec!(10.00), None, Some("dep-key"))
        .await
        .unwrap();
    assert!(replay.duplicate);
    assert_eq!(replay.transaction_id, deposit.transaction_id);
    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(110.00));

    engine
        .withdraw(&a, dec!(10.00), None, Some("wd-key"))
        .await
        .unwrap();
    let replay = engine
        .withdraw(&a, dec!(10.00), None, Some("wd-key"))
        .await
        .unwrap();
    assert!(replay.duplicate);
    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(100.00));
}

/// Test sink capturing events in memory.
struct CapturingSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl CapturingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for CapturingSink {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn audit_events_fire_for_success_and_rejection() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("bank.db")).await.unwrap();
    let sink = CapturingSink::new();
    let engine = TransferEngine::new(store).with_audit_sink(sink.clone());

    let a = open_with(&engine, dec!(100.00)).await;
    engine.deposit(&a, dec!(25.00), None, None).await.unwrap();
    engine.withdraw(&a, dec!(999.00), None, None).await.unwrap_err();

    let events = sink.events();
    assert_eq!(events.len(), 3);

    assert_eq!(events[0].operation, "open_account");
    assert_eq!(events[0].outcome, "ok");

    assert_eq!(events[1].operation, "deposit");
    assert_eq!(events[1].outcome, "ok");
    assert!(events[1].detail.contains("25.00"));
    assert!(events[1].detail.contains(&a));

    assert_eq!(events[2].operation, "withdraw");
    assert_eq!(events[2].outcome, "insufficient-funds");
}

#[tokio::test]
async fn ledger_rows_are_complete_per_operation() {
    let (_dir, engine) = new_engine().await;
    let a = open_with(&engine, Decimal::ZERO).await;

    engine.deposit(&a, dec!(40.00), Some("salary"), None).await.unwrap();
    engine.withdraw(&a, dec!(15.00), None, None).await.unwrap();

    let history = engine.history(&a).await.unwrap();
    // newest first: WITHDRAWAL, DEPOSIT, OPEN_ACCOUNT
    assert_eq!(history.len(), 3);

    assert_eq!(history[0].tx_type, TransactionType::Withdrawal);
    assert_eq!(history[0].amount, dec!(15.00));
    assert_eq!(history[0].from_account.as_ref().unwrap().as_str(), a);
    assert!(history[0].to_account.is_none());
    assert_eq!(history[0].description, "Withdrawal");

    assert_eq!(history[1].tx_type, TransactionType::Deposit);
    assert_eq!(history[1].amount, dec!(40.00));
    assert!(history[1].from_account.is_none());
    assert_eq!(history[1].to_account.as_ref().unwrap().as_str(), a);
    assert_eq!(history[1].description, "salary");

    assert_eq!(engine.account(&a).await.unwrap().balance, dec!(25.00));
}
