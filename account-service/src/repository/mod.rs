//! Ledger store: durable persistence of users, accounts and balances
//!
//! The store is the only component that touches storage. Every multi-row write
//! is all-or-nothing, and balances are only ever changed through
//! [`LedgerStore::compare_and_swap_balance`], which lets callers serialize
//! concurrent adjustments of the same row without holding locks across
//! requests.

mod memory;
mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::{Account, Balance, User};
use uuid::Uuid;

pub use memory::{InMemoryLedgerStore, RowCounts};
pub use postgres::PostgresLedgerStore;

/// Ledger store trait defining the interface for ledger data storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a user with its accounts and balances in one atomic unit
    ///
    /// Fails with [`Error::Conflict`] when the username or any
    /// (user, account type) pair already exists; nothing is written then.
    async fn create_user_with_accounts(
        &self,
        user: &User,
        accounts: &[Account],
        balances: &[Balance],
    ) -> Result<()>;

    /// Add one account and its balance to an existing user
    async fn add_account(&self, account: &Account, balance: &Balance) -> Result<()>;

    /// Get a user by ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by username
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All accounts of a user, oldest first; empty when the user has none
    async fn find_accounts_by_user(&self, user_id: Uuid) -> Result<Vec<Account>>;

    /// Current balance row of an account, or [`Error::NotFound`]
    async fn get_balance(&self, account_id: Uuid) -> Result<Balance>;

    /// Replace the stored amount only if it still equals `expected`
    ///
    /// Returns `false` when another writer changed the row first and
    /// [`Error::NotFound`] when the row does not exist.
    async fn compare_and_swap_balance(
        &self,
        account_id: Uuid,
        expected: Amount,
        new_amount: Amount,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Shape checks shared by every store before a provisioning batch is written
pub(crate) fn validate_batch(user: &User, accounts: &[Account], balances: &[Balance]) -> Result<()> {
    let mut types = HashSet::new();
    let mut account_ids = HashSet::new();

    for account in accounts {
        if account.user_id != user.id {
            return Err(Error::InvalidArgument(format!(
                "account {} does not belong to user {}",
                account.id, user.id
            )));
        }
        if !types.insert(account.account_type) {
            return Err(Error::Conflict(format!(
                "duplicate {} account for user {}",
                account.account_type, user.id
            )));
        }
        account_ids.insert(account.id);
    }

    if account_ids.len() != accounts.len() {
        return Err(Error::InvalidArgument("duplicate account id in batch".to_string()));
    }

    if balances.len() != accounts.len() {
        return Err(Error::InvalidArgument(format!(
            "expected {} balances, got {}",
            accounts.len(),
            balances.len()
        )));
    }

    let mut seen = HashSet::new();
    for balance in balances {
        if !account_ids.contains(&balance.account_id) || !seen.insert(balance.account_id) {
            return Err(Error::InvalidArgument(format!(
                "balance for account {} does not match the batch",
                balance.account_id
            )));
        }
    }

    Ok(())
}
