//! Balance mutation and balance queries
//!
//! [`BalanceEngine::adjust`] applies signed deltas with an optimistic
//! read-compute-swap loop: the store only accepts the new amount if the row
//! still holds the amount that was read, so two concurrent adjustments of the
//! same account can never overwrite each other. Adjustments of different
//! accounts never interact.
//!
//! The engine performs no floor or ceiling checks. Callers that must not
//! overdraw consult [`BalanceQuery::has_sufficient_balance`] first; that check
//! is point-in-time and advisory, another debit may land between the check and
//! the adjustment.

use std::sync::Arc;

use common::decimal::{precision, Amount};
use common::error::{Error, Result};
use common::model::{timestamp_now, Balance};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::repository::LedgerStore;

/// Default number of compare-and-swap attempts per adjustment
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Applies signed adjustments to balances
pub struct BalanceEngine {
    store: Arc<dyn LedgerStore>,
    max_attempts: u32,
}

impl BalanceEngine {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(store: Arc<dyn LedgerStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Add `delta` to the balance of `account_id` and return the new balance
    ///
    /// Fails with [`Error::Contention`] once `max_attempts` swaps in a row
    /// have lost against concurrent writers.
    pub async fn adjust(&self, account_id: Uuid, delta: Amount) -> Result<Balance> {
        for attempt in 1..=self.max_attempts {
            let current = self.store.get_balance(account_id).await?;
            let new_amount = current
                .amount
                .checked_add(delta)
                .map(precision::round_amount)
                .filter(|amount| precision::within_range(*amount))
                .ok_or_else(|| Error::InvalidArgument(format!("balance of account {} would overflow", account_id)))?;
            let updated_at = timestamp_now();

            let swapped = self
                .store
                .compare_and_swap_balance(account_id, current.amount, new_amount, updated_at)
                .await?;

            if swapped {
                debug!(
                    "Adjusted account {} by {}: {} -> {}",
                    account_id, delta, current.amount, new_amount
                );
                return Ok(Balance {
                    account_id,
                    amount: new_amount,
                    latest_updated_at: updated_at,
                });
            }

            debug!(
                "Balance of account {} changed concurrently (attempt {}/{})",
                account_id, attempt, self.max_attempts
            );
            tokio::task::yield_now().await;
        }

        warn!("Giving up adjusting account {} after {} attempts", account_id, self.max_attempts);
        Err(Error::Contention(format!(
            "balance of account {} is being updated concurrently, gave up after {} attempts",
            account_id, self.max_attempts
        )))
    }
}

/// Read-only balance access
pub struct BalanceQuery {
    store: Arc<dyn LedgerStore>,
}

impl BalanceQuery {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Current balance, or [`Error::NotFound`] if the account has no balance row
    pub async fn get_balance(&self, account_id: Uuid) -> Result<Balance> {
        self.store.get_balance(account_id).await
    }

    /// Whether the balance is at least `required` at this moment
    pub async fn has_sufficient_balance(&self, account_id: Uuid, required: Amount) -> Result<bool> {
        let balance = self.store.get_balance(account_id).await?;
        Ok(balance.covers(required))
    }
}
