//! Ledger RPC handlers
//!
//! Every RPC is a `POST /rpc/<Method>` with a camelCase JSON body. Handlers
//! follow the same shape:
//! - validate the request at the boundary
//! - call the ledger service under the request deadline
//! - wrap the result in `ApiResponse`

use std::sync::Arc;

use axum::extract::State;
use chrono::{DateTime, SecondsFormat, Utc};
use common::decimal::Amount;
use common::error::Error;
use common::model::{Account, Balance};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::api::json::RpcJson;
use crate::api::response::ApiResponse;
use crate::api::validation::{parse_id, require_non_empty, require_non_negative, require_representable};
use crate::error::ApiError;
use crate::{with_deadline, AppState};

/// Wire format for timestamps: RFC3339, whole seconds, `Z` suffix
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Create user request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

/// Create user outcome
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    /// Human-readable outcome
    pub message: String,
    /// Set only when the user was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Create a user together with its onboarding accounts
#[utoipa::path(
    post,
    path = "/rpc/CreateUser",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created, or the username is taken", body = CreateUserResponse),
        (status = 400, description = "Empty username or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ledger"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    RpcJson(request): RpcJson<CreateUserRequest>,
) -> Result<ApiResponse<CreateUserResponse>, ApiError> {
    let username = require_non_empty("username", &request.username)?;
    require_non_empty("password", &request.password)?;

    let outcome = with_deadline(state.request_timeout, state.ledger.create_user(username, &request.password)).await;

    let response = match outcome {
        Ok(provisioned) => {
            info!("Created user {} ({})", provisioned.user.username, provisioned.user.id);
            CreateUserResponse {
                message: "user created successfully".to_string(),
                user_id: Some(provisioned.user.id.to_string()),
            }
        }
        Err(Error::Conflict(reason)) => {
            debug!("CreateUser for {} rejected: {}", username, reason);
            CreateUserResponse {
                message: reason,
                user_id: None,
            }
        }
        Err(e) => return Err(e.into()),
    };

    Ok(ApiResponse::new(response))
}

/// Accounts request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountsByUserIdRequest {
    pub user_id: String,
}

/// Account as exposed over RPC
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub user_id: String,
    /// One of `referral`, `main`, `disbursement`, `payment-service-provider`
    pub account_type: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            user_id: account.user_id.to_string(),
            account_type: account.account_type.as_str().to_string(),
            status: account.status.as_str().to_string(),
            created_at: format_timestamp(account.created_at),
            updated_at: format_timestamp(account.updated_at),
        }
    }
}

/// Accounts of a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountView>,
}

/// List every account of a user
#[utoipa::path(
    post,
    path = "/rpc/GetAccountsByUserId",
    request_body = GetAccountsByUserIdRequest,
    responses(
        (status = 200, description = "Accounts of the user, possibly empty", body = AccountsResponse),
        (status = 400, description = "Malformed user id"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ledger"
)]
pub async fn get_accounts_by_user_id(
    State(state): State<Arc<AppState>>,
    RpcJson(request): RpcJson<GetAccountsByUserIdRequest>,
) -> Result<ApiResponse<AccountsResponse>, ApiError> {
    let user_id = parse_id("userId", &request.user_id)?;

    let accounts = with_deadline(state.request_timeout, state.ledger.get_accounts_by_user(user_id)).await?;

    Ok(ApiResponse::new(AccountsResponse {
        accounts: accounts.into_iter().map(AccountView::from).collect(),
    }))
}

/// Balance request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetAccountBalanceRequest {
    pub account_id: String,
}

/// Balance of an account
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    #[schema(value_type = String)]
    pub balance: Amount,
    pub latest_updated_at: String,
}

impl From<Balance> for BalanceView {
    fn from(balance: Balance) -> Self {
        Self {
            balance: balance.amount,
            latest_updated_at: format_timestamp(balance.latest_updated_at),
        }
    }
}

/// Read the current balance of an account
#[utoipa::path(
    post,
    path = "/rpc/GetAccountBalance",
    request_body = GetAccountBalanceRequest,
    responses(
        (status = 200, description = "Current balance", body = BalanceView),
        (status = 400, description = "Malformed account id"),
        (status = 404, description = "Account has no balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ledger"
)]
pub async fn get_account_balance(
    State(state): State<Arc<AppState>>,
    RpcJson(request): RpcJson<GetAccountBalanceRequest>,
) -> Result<ApiResponse<BalanceView>, ApiError> {
    let account_id = parse_id("accountId", &request.account_id)?;

    let balance = with_deadline(state.request_timeout, state.ledger.get_balance(account_id)).await?;

    Ok(ApiResponse::new(balance.into()))
}

/// Balance adjustment request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAccountBalanceRequest {
    pub account_id: String,
    /// Signed amount added to the current balance
    #[schema(value_type = String)]
    pub balance: Amount,
}

/// Add a signed amount to the balance of an account
#[utoipa::path(
    post,
    path = "/rpc/SetAccountBalance",
    request_body = SetAccountBalanceRequest,
    responses(
        (status = 200, description = "Balance after the adjustment", body = BalanceView),
        (status = 400, description = "Malformed account id or amount"),
        (status = 404, description = "Account has no balance"),
        (status = 409, description = "Too much contention on the balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ledger"
)]
pub async fn set_account_balance(
    State(state): State<Arc<AppState>>,
    RpcJson(request): RpcJson<SetAccountBalanceRequest>,
) -> Result<ApiResponse<BalanceView>, ApiError> {
    let account_id = parse_id("accountId", &request.account_id)?;
    let delta = require_representable("balance", request.balance)?;

    let balance = with_deadline(state.request_timeout, state.ledger.adjust_balance(account_id, delta)).await?;

    Ok(ApiResponse::new(balance.into()))
}

/// Sufficiency check request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccountBalanceRequest {
    pub account_id: String,
    #[schema(value_type = String)]
    pub amount: Amount,
}

/// Sufficiency check outcome
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAccountBalanceResponse {
    pub is_valid: bool,
}

/// Check whether an account holds at least `amount`
#[utoipa::path(
    post,
    path = "/rpc/ValidateAccountBalance",
    request_body = ValidateAccountBalanceRequest,
    responses(
        (status = 200, description = "Point-in-time sufficiency", body = ValidateAccountBalanceResponse),
        (status = 400, description = "Malformed account id or negative amount"),
        (status = 404, description = "Account has no balance"),
        (status = 500, description = "Internal server error")
    ),
    tag = "ledger"
)]
pub async fn validate_account_balance(
    State(state): State<Arc<AppState>>,
    RpcJson(request): RpcJson<ValidateAccountBalanceRequest>,
) -> Result<ApiResponse<ValidateAccountBalanceResponse>, ApiError> {
    let account_id = parse_id("accountId", &request.account_id)?;
    let amount = require_non_negative("amount", request.amount)?;

    let is_valid = with_deadline(
        state.request_timeout,
        state.ledger.has_sufficient_balance(account_id, amount),
    )
    .await?;

    Ok(ApiResponse::new(ValidateAccountBalanceResponse { is_valid }))
}

/// Liveness probe
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "ledger"
)]
pub async fn health() -> ApiResponse<HealthResponse> {
    ApiResponse::new(HealthResponse {
        status: "ok".to_string(),
    })
}
