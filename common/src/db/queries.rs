//! SQL statements used by the PostgreSQL ledger store

// User Queries

pub const INSERT_USER: &str =
    "INSERT INTO users (id, username, password, status, created_at, updated_at)
     VALUES ($1, $2, $3, $4, $5, $6)";

pub const SELECT_USER_BY_ID: &str =
    "SELECT id, username, password, status, created_at, updated_at
     FROM users
     WHERE id = $1";

pub const SELECT_USER_BY_USERNAME: &str =
    "SELECT id, username, password, status, created_at, updated_at
     FROM users
     WHERE username = $1";

// Account Queries

pub const INSERT_ACCOUNT: &str =
    "INSERT INTO accounts (id, user_id, account_type, status, created_at, updated_at)
     VALUES ($1, $2, $3, $4, $5, $6)";

pub const SELECT_ACCOUNTS_BY_USER: &str =
    "SELECT id, user_id, account_type, status, created_at, updated_at
     FROM accounts
     WHERE user_id = $1
     ORDER BY created_at, account_type";

// Balance Queries

pub const INSERT_BALANCE: &str =
    "INSERT INTO balances (account_id, balance, latest_updated_at)
     VALUES ($1, $2, $3)";

pub const SELECT_BALANCE: &str =
    "SELECT account_id, balance, latest_updated_at
     FROM balances
     WHERE account_id = $1";

/// Conditional update; affects zero rows when another writer got there first
pub const COMPARE_AND_SWAP_BALANCE: &str =
    "UPDATE balances
     SET balance = $3, latest_updated_at = $4
     WHERE account_id = $1 AND balance = $2";
