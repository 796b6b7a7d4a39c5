//! Account models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Role an account plays for its owner
///
/// The wire form is the kebab-case name; storage uses the numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountType {
    Referral,
    Main,
    Disbursement,
    PaymentServiceProvider,
}

impl AccountType {
    /// Every account type, in storage-code order
    pub const ALL: [AccountType; 4] = [
        AccountType::Referral,
        AccountType::Main,
        AccountType::Disbursement,
        AccountType::PaymentServiceProvider,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Referral => "referral",
            AccountType::Main => "main",
            AccountType::Disbursement => "disbursement",
            AccountType::PaymentServiceProvider => "payment-service-provider",
        }
    }

    /// Code stored in `accounts.account_type`
    pub fn code(&self) -> &'static str {
        match self {
            AccountType::Referral => "1001",
            AccountType::Main => "1002",
            AccountType::Disbursement => "1003",
            AccountType::PaymentServiceProvider => "1004",
        }
    }

    /// Parse a stored code
    pub fn from_code(code: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown account type code: {}", code)))
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown account type: {}", s)))
    }
}

/// Account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            other => Err(Error::InvalidArgument(format!("unknown account status: {}", other))),
        }
    }
}

/// Account model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Role of the account, unique per user
    pub account_type: AccountType,
    /// Lifecycle status; accounts are deactivated, never deleted
    pub status: AccountStatus,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account for a user
    pub fn new(user_id: Uuid, account_type: AccountType) -> Self {
        let now = super::timestamp_now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_type,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }
}
