//! PostgreSQL ledger store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::db::models::{DbAccount, DbBalance, DbUser};
use common::db::{self, queries, LedgerTransaction, PgTransactionManager, TransactionManager};
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::{Account, Balance, User};
use sqlx::PgPool;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{validate_batch, LedgerStore};
use crate::config::AccountServiceConfig;

/// PostgreSQL store for ledger data
pub struct PostgresLedgerStore {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresLedgerStore {
    /// Create a store on top of an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        }
    }

    /// Connect a new pool with the configured bounds
    pub async fn with_config(config: &AccountServiceConfig) -> Result<Self> {
        let pool = db::init_db_pool(&config.database_url, &config.pool).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Commit on success, roll back otherwise
    async fn finish(tx: LedgerTransaction, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => tx.commit().await,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Failed to roll back transaction: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Turn constraint names into messages callers can show
fn describe_conflict(err: Error) -> Error {
    match err {
        Error::Conflict(msg) if msg.contains("users_username_key") => {
            Error::Conflict("user already exists".to_string())
        }
        Error::Conflict(msg) if msg.contains("accounts_user_id_account_type_key") => {
            Error::Conflict("account type already exists for user".to_string())
        }
        other => other,
    }
}

async fn insert_account(tx: &mut LedgerTransaction, account: &Account) -> Result<()> {
    tx.execute(
        sqlx::query(queries::INSERT_ACCOUNT)
            .bind(account.id)
            .bind(account.user_id)
            .bind(account.account_type.code())
            .bind(account.status.as_str())
            .bind(account.created_at)
            .bind(account.updated_at),
    )
    .await?;
    Ok(())
}

async fn insert_balance(tx: &mut LedgerTransaction, balance: &Balance) -> Result<()> {
    tx.execute(
        sqlx::query(queries::INSERT_BALANCE)
            .bind(balance.account_id)
            .bind(balance.amount)
            .bind(balance.latest_updated_at),
    )
    .await?;
    Ok(())
}

async fn insert_user_batch(
    tx: &mut LedgerTransaction,
    user: &User,
    accounts: &[Account],
    balances: &[Balance],
) -> Result<()> {
    tx.execute(
        sqlx::query(queries::INSERT_USER)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.password)
            .bind(user.status.as_str())
            .bind(user.created_at)
            .bind(user.updated_at),
    )
    .await?;

    for account in accounts {
        insert_account(tx, account).await?;
    }
    for balance in balances {
        insert_balance(tx, balance).await?;
    }
    Ok(())
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn create_user_with_accounts(
        &self,
        user: &User,
        accounts: &[Account],
        balances: &[Balance],
    ) -> Result<()> {
        validate_batch(user, accounts, balances)?;
        debug!("Inserting user {} with {} accounts", user.id, accounts.len());

        let mut tx = self.transaction_manager.begin_transaction().await?;
        let outcome = insert_user_batch(&mut tx, user, accounts, balances).await;
        Self::finish(tx, outcome).await.map_err(describe_conflict)?;

        info!("Created user {} with {} accounts", user.id, accounts.len());
        Ok(())
    }

    async fn add_account(&self, account: &Account, balance: &Balance) -> Result<()> {
        if balance.account_id != account.id {
            return Err(Error::InvalidArgument(format!(
                "balance for account {} does not match account {}",
                balance.account_id, account.id
            )));
        }

        let mut tx = self.transaction_manager.begin_transaction().await?;
        let outcome = async {
            let owner = tx
                .fetch_optional(sqlx::query(queries::SELECT_USER_BY_ID).bind(account.user_id))
                .await?;
            if owner.is_none() {
                return Err(Error::NotFound(format!("user {}", account.user_id)));
            }
            insert_account(&mut tx, account).await?;
            insert_balance(&mut tx, balance).await
        }
        .await;

        Self::finish(tx, outcome).await.map_err(describe_conflict)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query_as::<_, DbUser>(queries::SELECT_USER_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, DbUser>(queries::SELECT_USER_BY_USERNAME)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_accounts_by_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        debug!("Getting accounts for user: {}", user_id);

        let rows = sqlx::query_as::<_, DbAccount>(queries::SELECT_ACCOUNTS_BY_USER)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn get_balance(&self, account_id: Uuid) -> Result<Balance> {
        sqlx::query_as::<_, DbBalance>(queries::SELECT_BALANCE)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Balance::from)
            .ok_or_else(|| Error::NotFound(format!("balance for account {}", account_id)))
    }

    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Amount,
        new_amount: Amount,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(queries::COMPARE_AND_SWAP_BALANCE)
            .bind(account_id)
            .bind(expected)
            .bind(new_amount)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Zero rows means either a lost race or a missing row
        self.get_balance(account_id).await?;
        Ok(false)
    }
}
