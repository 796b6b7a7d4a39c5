//! In-memory ledger store
//!
//! All tables sit behind one lock, so a provisioning batch becomes visible in
//! a single step exactly like a committed database transaction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::{Account, AccountType, Balance, User};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{validate_batch, LedgerStore};

#[derive(Default)]
struct LedgerTables {
    users: HashMap<Uuid, User>,
    usernames: HashMap<String, Uuid>,
    accounts: HashMap<Uuid, Account>,
    account_types: HashSet<(Uuid, AccountType)>,
    balances: HashMap<Uuid, Balance>,
}

impl LedgerTables {
    fn check_account_free(&self, account: &Account) -> Result<()> {
        if self.accounts.contains_key(&account.id) || self.balances.contains_key(&account.id) {
            return Err(Error::Conflict(format!("account {} already exists", account.id)));
        }
        if self.account_types.contains(&(account.user_id, account.account_type)) {
            return Err(Error::Conflict(format!(
                "account type already exists for user: {}",
                account.account_type
            )));
        }
        Ok(())
    }

    fn insert_account(&mut self, account: &Account) {
        self.account_types.insert((account.user_id, account.account_type));
        self.accounts.insert(account.id, account.clone());
    }
}

/// Row counts, used by tests to assert that nothing partial was left behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub users: usize,
    pub accounts: usize,
    pub balances: usize,
}

/// In-memory store for ledger data
#[derive(Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<LedgerTables>,
}

impl InMemoryLedgerStore {
    /// Create a new, empty in-memory ledger store
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn row_counts(&self) -> RowCounts {
        let tables = self.tables.read().await;
        RowCounts {
            users: tables.users.len(),
            accounts: tables.accounts.len(),
            balances: tables.balances.len(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_user_with_accounts(
        &self,
        user: &User,
        accounts: &[Account],
        balances: &[Balance],
    ) -> Result<()> {
        validate_batch(user, accounts, balances)?;

        let mut tables = self.tables.write().await;

        // Every check runs before the first insert
        if tables.usernames.contains_key(&user.username) {
            return Err(Error::Conflict("user already exists".to_string()));
        }
        if tables.users.contains_key(&user.id) {
            return Err(Error::Conflict(format!("user {} already exists", user.id)));
        }
        for account in accounts {
            tables.check_account_free(account)?;
        }

        tables.usernames.insert(user.username.clone(), user.id);
        tables.users.insert(user.id, user.clone());
        for account in accounts {
            tables.insert_account(account);
        }
        for balance in balances {
            tables.balances.insert(balance.account_id, balance.clone());
        }

        debug!("Stored user {} with {} accounts", user.id, accounts.len());
        Ok(())
    }

    async fn add_account(&self, account: &Account, balance: &Balance) -> Result<()> {
        if balance.account_id != account.id {
            return Err(Error::InvalidArgument(format!(
                "balance for account {} does not match account {}",
                balance.account_id, account.id
            )));
        }

        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&account.user_id) {
            return Err(Error::NotFound(format!("user {}", account.user_id)));
        }
        tables.check_account_free(account)?;

        tables.insert_account(account);
        tables.balances.insert(balance.account_id, balance.clone());
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .usernames
            .get(username)
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_accounts_by_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables
            .accounts
            .values()
            .filter(|account| account.user_id == user_id)
            .cloned()
            .collect();

        accounts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.account_type.cmp(&b.account_type))
        });
        Ok(accounts)
    }

    async fn get_balance(&self, account_id: Uuid) -> Result<Balance> {
        self.tables
            .read()
            .await
            .balances
            .get(&account_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("balance for account {}", account_id)))
    }

    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Amount,
        new_amount: Amount,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let balance = tables
            .balances
            .get_mut(&account_id)
            .ok_or_else(|| Error::NotFound(format!("balance for account {}", account_id)))?;

        if balance.amount != expected {
            return Ok(false);
        }

        balance.amount = new_amount;
        balance.latest_updated_at = updated_at;
        Ok(true)
    }
}
