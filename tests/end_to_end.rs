mod support;

use std::sync::Arc;

use axum::http::StatusCode;
use futures::future::join_all;
use ledger_tests::account_service::{AccountServiceConfig, InMemoryLedgerStore, LedgerService, LedgerStore};
use ledger_tests::common::model::AccountType;
use rust_decimal_macros::dec;
use serde_json::json;

use support::{adjust, balance_of, is_valid, onboard, router, rpc};

#[tokio::test]
async fn test_alice_scenario() {
    let router = router(LedgerService::new());
    let (_, account_id) = onboard(&router, "alice").await;

    assert_eq!(balance_of(&router, &account_id).await, dec!(0));

    assert_eq!(adjust(&router, &account_id, dec!(150)).await, StatusCode::OK);
    assert_eq!(balance_of(&router, &account_id).await, dec!(150));

    assert_eq!(adjust(&router, &account_id, dec!(-50)).await, StatusCode::OK);
    assert_eq!(balance_of(&router, &account_id).await, dec!(100));

    assert!(!is_valid(&router, &account_id, dec!(200)).await);
    assert!(is_valid(&router, &account_id, dec!(100)).await);
    assert!(is_valid(&router, &account_id, dec!(99.99)).await);
}

#[tokio::test]
async fn test_second_signup_with_same_username_is_refused() {
    let store = Arc::new(InMemoryLedgerStore::new());
    let shared: Arc<dyn LedgerStore> = store.clone();
    let router = router(LedgerService::with_store(shared, &AccountServiceConfig::default()));

    onboard(&router, "alice").await;
    let (status, body) = rpc(&router, "CreateUser", json!({ "username": "alice", "password": "again" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "user already exists");
    assert!(body["data"].get("userId").is_none());

    let counts = store.row_counts().await;
    assert_eq!(counts.users, 1);
    assert_eq!(counts.accounts, 1);
    assert_eq!(counts.balances, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_not_lost() {
    let config = AccountServiceConfig {
        balance_max_attempts: 10_000,
        ..AccountServiceConfig::default()
    };
    let ledger = LedgerService::with_store(Arc::new(InMemoryLedgerStore::new()), &config);
    let router = router(ledger);
    let (_, account_id) = onboard(&router, "bob").await;

    let requests = (0..50).map(|_| {
        let router = router.clone();
        let account_id = account_id.clone();
        tokio::spawn(async move { adjust(&router, &account_id, dec!(1)).await })
    });

    for status in join_all(requests).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    assert_eq!(balance_of(&router, &account_id).await, dec!(50));
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let router = router(LedgerService::new());
    let (user_id, account_id) = onboard(&router, "carol").await;
    adjust(&router, &account_id, dec!(12.5)).await;

    let (_, first) = rpc(&router, "GetAccountsByUserId", json!({ "userId": user_id })).await;
    let (_, second) = rpc(&router, "GetAccountsByUserId", json!({ "userId": user_id })).await;
    assert_eq!(first, second);

    let (_, first) = rpc(&router, "GetAccountBalance", json!({ "accountId": account_id })).await;
    let (_, second) = rpc(&router, "GetAccountBalance", json!({ "accountId": account_id })).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_full_onboarding_lists_every_account_type() {
    let config = AccountServiceConfig {
        onboarding_account_types: AccountType::ALL.to_vec(),
        ..AccountServiceConfig::default()
    };
    let router = router(LedgerService::with_store(Arc::new(InMemoryLedgerStore::new()), &config));
    let (user_id, _) = onboard(&router, "dave").await;

    let (_, body) = rpc(&router, "GetAccountsByUserId", json!({ "userId": user_id })).await;
    let mut types: Vec<String> = body["data"]["accounts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|account| account["accountType"].as_str().unwrap().to_string())
        .collect();
    types.sort();

    assert_eq!(types, vec!["disbursement", "main", "payment-service-provider", "referral"]);
}
