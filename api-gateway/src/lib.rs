//! RPC facade over the ledger service

pub mod api;
pub mod config;
pub mod error;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use account_service::LedgerService;
use axum::{
    routing::{get, post},
    Router,
};
use common::error::{Error, Result};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::ledger;

/// App state shared across handlers
pub struct AppState {
    /// Ledger service
    pub ledger: Arc<LedgerService>,
    /// Deadline for a single RPC
    pub request_timeout: Duration,
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        ledger::create_user,
        ledger::get_accounts_by_user_id,
        ledger::get_account_balance,
        ledger::set_account_balance,
        ledger::validate_account_balance,
        ledger::health,
    ),
    components(
        schemas(
            ledger::CreateUserRequest,
            ledger::CreateUserResponse,
            ledger::GetAccountsByUserIdRequest,
            ledger::AccountView,
            ledger::AccountsResponse,
            ledger::GetAccountBalanceRequest,
            ledger::BalanceView,
            ledger::SetAccountBalanceRequest,
            ledger::ValidateAccountBalanceRequest,
            ledger::ValidateAccountBalanceResponse,
            ledger::HealthResponse,
        )
    ),
    tags(
        (name = "ledger", description = "User provisioning and account balances")
    ),
    info(
        title = "Account Ledger API",
        version = "1.0.0",
        description = "RPC endpoints for user onboarding, account listing and balance management"
    )
)]
pub struct ApiDoc;

/// Run `fut` under `timeout`; the future is dropped when the deadline passes
pub async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::DeadlineExceeded(format!(
            "request did not complete within {}ms",
            timeout.as_millis()
        ))),
    }
}

/// Build the router with every RPC, docs and middleware
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let rpc_routes = Router::new()
        .route("/CreateUser", post(ledger::create_user))
        .route("/GetAccountsByUserId", post(ledger::get_accounts_by_user_id))
        .route("/GetAccountBalance", post(ledger::get_account_balance))
        .route("/SetAccountBalance", post(ledger::set_account_balance))
        .route("/ValidateAccountBalance", post(ledger::validate_account_balance));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .nest("/rpc", rpc_routes)
        .route("/health", get(ledger::health))
        .merge(swagger_ui)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
