//! Local environment seed data

use common::decimal::{dec, Amount};
use common::error::Result;
use common::model::{Account, AccountType, Balance, User};
use tracing::info;

use crate::provisioning::hash_in_background;
use crate::repository::LedgerStore;

pub const ADMIN_USERNAME: &str = "admin";

/// Opening balance of the admin referral account
pub const ADMIN_REFERRAL_FUNDS: Amount = dec!(10000);

/// Create the `admin` user with one account of every type
///
/// Returns `false` when the user already exists.
pub async fn seed_local_data(store: &dyn LedgerStore) -> Result<bool> {
    if store.find_user_by_username(ADMIN_USERNAME).await?.is_some() {
        info!("Seed data already present");
        return Ok(false);
    }

    let admin = User::new(ADMIN_USERNAME, hash_in_background(ADMIN_USERNAME.to_string()).await?);
    let accounts: Vec<Account> = AccountType::ALL
        .iter()
        .map(|account_type| Account::new(admin.id, *account_type))
        .collect();
    let balances: Vec<Balance> = accounts
        .iter()
        .map(|account| match account.account_type {
            AccountType::Referral => Balance::with_amount(account.id, ADMIN_REFERRAL_FUNDS),
            _ => Balance::new(account.id),
        })
        .collect();

    store.create_user_with_accounts(&admin, &accounts, &balances).await?;
    info!("Seeded user {} with {} accounts", ADMIN_USERNAME, accounts.len());
    Ok(true)
}
