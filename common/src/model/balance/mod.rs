//! Balance model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;

/// Balance model
///
/// Exactly one balance exists per account for the lifetime of the account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Account ID
    pub account_id: Uuid,
    /// Signed amount
    pub amount: Amount,
    /// Last update timestamp
    pub latest_updated_at: DateTime<Utc>,
}

impl Balance {
    /// Create a new balance with a zero amount
    pub fn new(account_id: Uuid) -> Self {
        Self::with_amount(account_id, Amount::ZERO)
    }

    /// Create a new balance with an opening amount
    pub fn with_amount(account_id: Uuid, amount: Amount) -> Self {
        Self {
            account_id,
            amount,
            latest_updated_at: super::timestamp_now(),
        }
    }

    /// Whether the balance covers `required`
    pub fn covers(&self, required: Amount) -> bool {
        self.amount >= required
    }
}
