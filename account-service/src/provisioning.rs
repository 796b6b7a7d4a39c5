//! Account provisioning workflow
//!
//! Creates a user together with its onboarding accounts and their zero
//! balances as one atomic unit. Referral issuance happens afterwards and never
//! affects the outcome.

use std::sync::Arc;

use common::error::{Error, Result};
use common::model::{Account, AccountType, Balance, User};
use tracing::{info, warn};
use uuid::Uuid;

use crate::password::hash_password;
use crate::referral::ReferralNotifier;
use crate::repository::LedgerStore;

/// A freshly provisioned user and the accounts opened for it
#[derive(Debug, Clone)]
pub struct ProvisionedUser {
    pub user: User,
    pub accounts: Vec<Account>,
}

impl ProvisionedUser {
    /// Account of the given type, if one was opened
    pub fn account(&self, account_type: AccountType) -> Option<&Account> {
        self.accounts.iter().find(|a| a.account_type == account_type)
    }
}

/// Provisioning workflow
pub struct ProvisioningWorkflow {
    store: Arc<dyn LedgerStore>,
    onboarding_types: Vec<AccountType>,
    referrals: Option<ReferralNotifier>,
}

impl ProvisioningWorkflow {
    /// Create a workflow that opens one account per type in `onboarding_types`
    pub fn new(store: Arc<dyn LedgerStore>, onboarding_types: Vec<AccountType>) -> Self {
        Self {
            store,
            onboarding_types,
            referrals: None,
        }
    }

    /// Request a referral code for every user created from now on
    pub fn with_referrals(mut self, referrals: ReferralNotifier) -> Self {
        self.referrals = Some(referrals);
        self
    }

    pub fn referrals(&self) -> Option<&ReferralNotifier> {
        self.referrals.as_ref()
    }

    /// Create a user with its onboarding accounts
    pub async fn create_user(&self, username: &str, password: &str) -> Result<ProvisionedUser> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidArgument("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(Error::InvalidArgument("password must not be empty".to_string()));
        }
        if self.onboarding_types.is_empty() {
            return Err(Error::ConfigurationError("no onboarding account types configured".to_string()));
        }

        let password_hash = hash_in_background(password.to_string()).await?;
        let user = User::new(username, password_hash);
        let accounts: Vec<Account> = self
            .onboarding_types
            .iter()
            .map(|account_type| Account::new(user.id, *account_type))
            .collect();
        let balances: Vec<Balance> = accounts.iter().map(|account| Balance::new(account.id)).collect();

        if let Err(e) = self.store.create_user_with_accounts(&user, &accounts, &balances).await {
            warn!("Failed to create user {}: {}", username, e);
            return Err(e);
        }

        info!("Provisioned user {} ({}) with {} accounts", user.id, username, accounts.len());

        if let Some(referrals) = &self.referrals {
            // Outcome is tracked by the notifier's backlog, not by this request
            let _ = referrals.user_created(user.id);
        }

        Ok(ProvisionedUser { user, accounts })
    }

    /// Open one more account, with a zero balance, for an existing user
    pub async fn open_account(&self, user_id: Uuid, account_type: AccountType) -> Result<Account> {
        let account = Account::new(user_id, account_type);
        let balance = Balance::new(account.id);

        self.store.add_account(&account, &balance).await?;
        info!("Opened {} account {} for user {}", account_type, account.id, user_id);
        Ok(account)
    }
}

/// Hash on the blocking pool
pub(crate) async fn hash_in_background(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
}
