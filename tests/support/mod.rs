#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use ledger_tests::account_service::LedgerService;
use ledger_tests::api_gateway::{app, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Router over `ledger` with a generous deadline
pub fn router(ledger: LedgerService) -> Router {
    app(Arc::new(AppState {
        ledger: Arc::new(ledger),
        request_timeout: Duration::from_secs(30),
    }))
}

/// POST a JSON body to `/rpc/<method>`
pub async fn rpc(router: &Router, method: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/rpc/{}", method))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Create `username` and return the id of its first account
pub async fn onboard(router: &Router, username: &str) -> (String, String) {
    let (status, body) = rpc(router, "CreateUser", json!({ "username": username, "password": "secret" })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let user_id = body["data"]["userId"].as_str().unwrap().to_string();

    let (status, body) = rpc(router, "GetAccountsByUserId", json!({ "userId": user_id })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let account_id = body["data"]["accounts"][0]["id"].as_str().unwrap().to_string();

    (user_id, account_id)
}

pub async fn balance_of(router: &Router, account_id: &str) -> Decimal {
    let (status, body) = rpc(router, "GetAccountBalance", json!({ "accountId": account_id })).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["balance"].as_str().unwrap().parse().unwrap()
}

pub async fn adjust(router: &Router, account_id: &str, delta: Decimal) -> StatusCode {
    let (status, _) = rpc(
        router,
        "SetAccountBalance",
        json!({ "accountId": account_id, "balance": delta.to_string() }),
    )
    .await;
    status
}

pub async fn is_valid(router: &Router, account_id: &str, amount: Decimal) -> bool {
    let (status, body) = rpc(
        router,
        "ValidateAccountBalance",
        json!({ "accountId": account_id, "amount": amount.to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body["data"]["isValid"].as_bool().unwrap()
}
