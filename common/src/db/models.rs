//! Row types for the ledger tables
//!
//! Enumerations are stored as text, so rows are decoded into these plain
//! structs first and converted into domain models with `TryFrom`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::Error;
use crate::model::{Account, AccountType, Balance, User};

/// Database model for the users table
#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the accounts table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the balances table
#[derive(Debug, Clone, FromRow)]
pub struct DbBalance {
    pub account_id: Uuid,
    pub balance: Decimal,
    pub latest_updated_at: DateTime<Utc>,
}

impl TryFrom<DbUser> for User {
    type Error = Error;

    fn try_from(row: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            password: row.password,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbAccount> for Account {
    type Error = Error;

    fn try_from(row: DbAccount) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            user_id: row.user_id,
            account_type: AccountType::from_code(&row.account_type)?,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<DbBalance> for Balance {
    fn from(row: DbBalance) -> Self {
        Balance {
            account_id: row.account_id,
            amount: row.balance,
            latest_updated_at: row.latest_updated_at,
        }
    }
}
