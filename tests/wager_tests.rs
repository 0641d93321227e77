mod common;

use std::sync::atomic::Ordering;

use rust_decimal::Decimal;

use common::{
    binary_market, decrypted_oracle, handle, undecrypted_oracle, MockDecryptor, MockGateway,
    MockHintStore, ACCOUNT, CHAIN_ID,
};
use veilbet::chain::{GatewayError, OptionHandles, PoolHandles};
use veilbet::db::{balance_repo, wager_repo};
use veilbet::services::statistics::SnapshotStore;
use veilbet::services::wagers::{place_wager, WagerError, WagerRequest};

fn request(amount: i64) -> WagerRequest {
    WagerRequest {
        account: ACCOUNT.into(),
        option_index: 0,
        outcome: None,
        amount: Decimal::from(amount),
    }
}

async fn seed_balance(db: &sqlx::SqlitePool, amount: i64) {
    balance_repo::store_balance(
        db,
        ACCOUNT,
        CHAIN_ID,
        Decimal::from(amount),
        chrono::Duration::days(30),
    )
    .await
    .expect("Failed to seed balance");
}

#[tokio::test]
async fn test_place_wager_records_optimistically() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 1_000).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let hints = MockHintStore::default();
    let store = SnapshotStore::new();

    let record = place_wager(&db, &gateway, &decryptor, Some(&hints), &store, CHAIN_ID, "m1", request(100))
        .await
        .expect("wager should succeed");

    // Born revealed with the pre-trade price: (400+50)/(500+100) = 75%
    assert!(record.is_revealed);
    assert_eq!(record.price_at_wager, Some(Decimal::from(75)));
    assert_eq!(record.tx_hash.as_deref(), Some("0xtx1"));
    assert_eq!(gateway.submissions.load(Ordering::SeqCst), 1);

    // Ledger holds the record
    let ledger = wager_repo::list_for_market(&db, ACCOUNT, CHAIN_ID, "m1").await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0], record);

    // Balance debited optimistically
    let balance = balance_repo::get_valid(&db, ACCOUNT, CHAIN_ID).await.unwrap().unwrap();
    assert_eq!(balance.balance, Decimal::from(900));

    // Wager mirrored to the hint store
    assert_eq!(hints.recorded.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_pretrade_price_decrypts_only_needed_handles() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 1_000).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(undecrypted_oracle("m1", 1));
    gateway.set_handles(
        "m1",
        PoolHandles {
            total_volume: handle("0xvol"),
            participant_count: handle("0xcount"),
            options: vec![
                OptionHandles::Flat { shares: handle("0xa") },
                OptionHandles::Flat { shares: handle("0xb") },
            ],
        },
    );
    let decryptor = MockDecryptor::default();
    decryptor.set_amount(handle("0xvol"), 500);
    decryptor.set_raw(handle("0xcount"), 9);
    decryptor.set_amount(handle("0xa"), 400);
    decryptor.set_amount(handle("0xb"), 100);

    let store = SnapshotStore::new();
    let record = place_wager(&db, &gateway, &decryptor, None, &store, CHAIN_ID, "m1", request(100))
        .await
        .expect("wager should succeed");

    // The live pre-trade fetch prices against chain state, not a cache
    assert_eq!(record.price_at_wager, Some(Decimal::from(75)));
    // One batch for the pre-trade price, one for the post-trade refresh
    assert_eq!(decryptor.batch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_insufficient_balance_blocks_before_submission() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 10).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let store = SnapshotStore::new();

    let err = place_wager(&db, &gateway, &decryptor, None, &store, CHAIN_ID, "m1", request(100))
        .await
        .expect_err("wager should be rejected");

    assert!(matches!(err, WagerError::InsufficientBalance));
    assert_eq!(gateway.submissions.load(Ordering::SeqCst), 0);
    let ledger = wager_repo::list_for_market(&db, ACCOUNT, CHAIN_ID, "m1").await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_unknown_balance_blocks_with_specific_error() {
    let db = common::setup_test_db().await;
    // No balance cached at all

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let store = SnapshotStore::new();

    let err = place_wager(&db, &gateway, &decryptor, None, &store, CHAIN_ID, "m1", request(50))
        .await
        .expect_err("wager should be rejected");

    assert!(matches!(err, WagerError::BalanceUnknown));
}

#[tokio::test]
async fn test_failed_submission_leaves_state_untouched() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 1_000).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let store = SnapshotStore::new();

    let balance_before = balance_repo::get_valid(&db, ACCOUNT, CHAIN_ID).await.unwrap();
    let ledger_before = wager_repo::list_for_market(&db, ACCOUNT, CHAIN_ID, "m1").await.unwrap();

    // Fails after encryption, before confirmation
    *gateway.submit_error.lock().unwrap() =
        Some(GatewayError::Rejected("market has ended".into()));

    let err = place_wager(&db, &gateway, &decryptor, None, &store, CHAIN_ID, "m1", request(100))
        .await
        .expect_err("wager should fail");
    assert!(matches!(err, WagerError::ContractRejected(_)));

    let balance_after = balance_repo::get_valid(&db, ACCOUNT, CHAIN_ID).await.unwrap();
    let ledger_after = wager_repo::list_for_market(&db, ACCOUNT, CHAIN_ID, "m1").await.unwrap();
    assert_eq!(balance_before, balance_after);
    assert_eq!(ledger_before, ledger_after);
}

#[tokio::test]
async fn test_user_cancellation_reported_verbatim() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 1_000).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let store = SnapshotStore::new();

    *gateway.submit_error.lock().unwrap() = Some(GatewayError::Cancelled);

    let err = place_wager(&db, &gateway, &decryptor, None, &store, CHAIN_ID, "m1", request(100))
        .await
        .expect_err("wager should fail");
    assert!(matches!(err, WagerError::Cancelled));

    let ledger = wager_repo::list_for_market(&db, ACCOUNT, CHAIN_ID, "m1").await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_hint_store_failure_does_not_fail_the_wager() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 1_000).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let hints = MockHintStore::default();
    hints.fail_writes.store(true, Ordering::SeqCst);
    let store = SnapshotStore::new();

    let record = place_wager(&db, &gateway, &decryptor, Some(&hints), &store, CHAIN_ID, "m1", request(50))
        .await
        .expect("wager should still succeed");

    assert!(record.is_revealed);
    assert!(hints.recorded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_wager_exceeding_cached_balance_invalidates_cache() {
    let db = common::setup_test_db().await;
    seed_balance(&db, 100).await;

    let market = binary_market("m1");
    let gateway = MockGateway::with_market(market.clone());
    gateway.set_oracle(decrypted_oracle("m1"));
    let decryptor = MockDecryptor::default();
    let store = SnapshotStore::new();

    // Exactly the cached balance: allowed, debits to zero
    place_wager(&db, &gateway, &decryptor, None, &store, CHAIN_ID, "m1", request(100))
        .await
        .expect("wager should succeed");

    let balance = balance_repo::get_valid(&db, ACCOUNT, CHAIN_ID).await.unwrap().unwrap();
    assert_eq!(balance.balance, Decimal::ZERO);
}
