//! Domain models for the account ledger

pub mod user;
pub mod account;
pub mod balance;

use chrono::{DateTime, SubsecRound, Utc};

pub use account::{Account, AccountStatus, AccountType};
pub use balance::Balance;
pub use user::{User, UserStatus};

/// Current time at the microsecond precision of `TIMESTAMPTZ`
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
