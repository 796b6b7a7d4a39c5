use std::sync::Arc;
use std::time::Duration;

use account_service::{AccountServiceConfig, InMemoryLedgerStore, LedgerService, LedgerStore};
use api_gateway::{app, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Utc};
use common::decimal::Amount;
use common::model::{Account, Balance, User};
use common::Result;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn router_with(ledger: LedgerService, request_timeout: Duration) -> Router {
    app(Arc::new(AppState {
        ledger: Arc::new(ledger),
        request_timeout,
    }))
}

fn router() -> Router {
    router_with(LedgerService::new(), Duration::from_secs(5))
}

async fn call(router: &Router, method: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/rpc/{}", method))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_user(router: &Router, username: &str) -> String {
    let (status, body) = call(router, "CreateUser", json!({ "username": username, "password": "pw" })).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["userId"].as_str().unwrap().to_string()
}

async fn main_account(router: &Router, user_id: &str) -> String {
    let (status, body) = call(router, "GetAccountsByUserId", json!({ "userId": user_id })).await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["accounts"][0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_create_user_reports_success_and_conflict_in_message() {
    let router = router();

    let (status, body) = call(&router, "CreateUser", json!({ "username": "alice", "password": "pw" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "user created successfully");
    assert!(Uuid::parse_str(body["data"]["userId"].as_str().unwrap()).is_ok());

    let (status, body) = call(&router, "CreateUser", json!({ "username": "alice", "password": "other" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "user already exists");
    assert!(body["data"].get("userId").is_none());
}

#[tokio::test]
async fn test_create_user_rejects_blank_fields() {
    let router = router();

    let (status, body) = call(&router, "CreateUser", json!({ "username": "  ", "password": "pw" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_argument");
    assert!(body["requestId"].is_string());

    let (status, _) = call(&router, "CreateUser", json!({ "username": "bob", "password": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_accounts_are_listed_in_wire_format() {
    let router = router();
    let user_id = create_user(&router, "carol").await;

    let (status, body) = call(&router, "GetAccountsByUserId", json!({ "userId": user_id })).await;
    assert_eq!(status, StatusCode::OK);

    let accounts = body["data"]["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["userId"], user_id.as_str());
    assert_eq!(accounts[0]["accountType"], "main");
    assert_eq!(accounts[0]["status"], "active");

    let created_at = accounts[0]["createdAt"].as_str().unwrap();
    assert!(created_at.ends_with('Z'));
    assert!(DateTime::parse_from_rfc3339(created_at).is_ok());
    assert!(!created_at.contains('.'));
}

#[tokio::test]
async fn test_unknown_user_has_no_accounts() {
    let router = router();

    let (status, body) = call(&router, "GetAccountsByUserId", json!({ "userId": Uuid::new_v4().to_string() })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accounts"], json!([]));
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let router = router();

    for method in ["GetAccountBalance", "SetAccountBalance", "ValidateAccountBalance"] {
        let (status, body) = call(
            &router,
            method,
            json!({ "accountId": "not-a-uuid", "balance": "1", "amount": "1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", method);
        assert_eq!(body["error"]["code"], "invalid_argument");
    }

    let (status, _) = call(&router, "GetAccountsByUserId", json!({ "userId": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_account_is_not_found() {
    let router = router();
    let account_id = Uuid::new_v4().to_string();

    let (status, body) = call(&router, "GetAccountBalance", json!({ "accountId": account_id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = call(&router, "SetAccountBalance", json!({ "accountId": account_id, "balance": "5" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_balance_adjustments_accumulate() {
    let router = router();
    let user_id = create_user(&router, "dave").await;
    let account_id = main_account(&router, &user_id).await;

    let (status, body) = call(&router, "GetAccountBalance", json!({ "accountId": account_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"].as_str().unwrap().parse::<Amount>().unwrap(), Amount::ZERO);

    call(&router, "SetAccountBalance", json!({ "accountId": account_id, "balance": "150" })).await;
    let (status, body) = call(&router, "SetAccountBalance", json!({ "accountId": account_id, "balance": -50 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balance"].as_str().unwrap().parse::<Amount>().unwrap(), Amount::from(100));
    assert!(body["data"]["latestUpdatedAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_unparseable_bodies_use_the_error_envelope() {
    let router = router();
    let user_id = create_user(&router, "frank").await;
    let account_id = main_account(&router, &user_id).await;

    let (status, body) = call(&router, "SetAccountBalance", json!({ "accountId": account_id, "balance": "abc" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_argument");
    assert!(body["requestId"].is_string());

    let (status, body) = call(&router, "GetAccountBalance", json!({ "account": account_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_argument");

    let request = Request::builder()
        .method("POST")
        .uri("/rpc/CreateUser")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "invalid_argument");
}

#[tokio::test]
async fn test_amounts_beyond_column_range_are_rejected() {
    let router = router();
    let user_id = create_user(&router, "grace").await;
    let account_id = main_account(&router, &user_id).await;

    let (status, body) = call(
        &router,
        "SetAccountBalance",
        json!({ "accountId": account_id, "balance": "70000000000000000000000000000" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_argument");

    let (status, _) = call(
        &router,
        "SetAccountBalance",
        json!({ "accountId": account_id, "balance": "99999999999999999999" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&router, "SetAccountBalance", json!({ "accountId": account_id, "balance": "1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_argument");
}

#[tokio::test]
async fn test_validate_rejects_negative_amounts() {
    let router = router();
    let user_id = create_user(&router, "erin").await;
    let account_id = main_account(&router, &user_id).await;

    let (status, body) = call(&router, "ValidateAccountBalance", json!({ "accountId": account_id, "amount": "-1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_argument");

    let (status, body) = call(&router, "ValidateAccountBalance", json!({ "accountId": account_id, "amount": "0" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isValid"], true);
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_openapi_document_lists_every_rpc() {
    let request = Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap();
    let response = router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    for path in [
        "/rpc/CreateUser",
        "/rpc/GetAccountsByUserId",
        "/rpc/GetAccountBalance",
        "/rpc/SetAccountBalance",
        "/rpc/ValidateAccountBalance",
    ] {
        assert!(doc["paths"].get(path).is_some(), "{}", path);
    }
}

/// Store whose balance reads never finish in time
struct StalledStore {
    inner: InMemoryLedgerStore,
}

#[async_trait]
impl LedgerStore for StalledStore {
    async fn create_user_with_accounts(&self, user: &User, accounts: &[Account], balances: &[Balance]) -> Result<()> {
        self.inner.create_user_with_accounts(user, accounts, balances).await
    }

    async fn add_account(&self, account: &Account, balance: &Balance) -> Result<()> {
        self.inner.add_account(account, balance).await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn find_accounts_by_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        self.inner.find_accounts_by_user(user_id).await
    }

    async fn get_balance(&self, account_id: Uuid) -> Result<Balance> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        self.inner.get_balance(account_id).await
    }

    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Amount,
        new_amount: Amount,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.inner
            .compare_and_swap_balance(account_id, expected, new_amount, updated_at)
            .await
    }
}

#[tokio::test]
async fn test_slow_requests_hit_the_deadline() {
    let store: Arc<dyn LedgerStore> = Arc::new(StalledStore {
        inner: InMemoryLedgerStore::new(),
    });
    let ledger = LedgerService::with_store(store, &AccountServiceConfig::default());
    let router = router_with(ledger, Duration::from_millis(50));

    let (status, body) = call(
        &router,
        "GetAccountBalance",
        json!({ "accountId": Uuid::new_v4().to_string() }),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "deadline_exceeded");
}
