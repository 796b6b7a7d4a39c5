//! Ledger service implementation

use std::sync::Arc;
use std::time::Duration;

use common::decimal::Amount;
use common::error::{ErrorExt, Result};
use common::model::{Account, AccountType, Balance};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::balance::{BalanceEngine, BalanceQuery};
use crate::config::AccountServiceConfig;
use crate::provisioning::{ProvisionedUser, ProvisioningWorkflow};
use crate::referral::{HttpReferralClient, ReferralClient, ReferralNotifier};
use crate::repository::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};

/// Ledger service: provisioning, balance mutation and balance queries over one store
pub struct LedgerService {
    /// Store shared by every component
    store: Arc<dyn LedgerStore>,
    provisioning: ProvisioningWorkflow,
    engine: BalanceEngine,
    query: BalanceQuery,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres,
}

impl LedgerService {
    /// Create a new ledger service backed by an in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryLedgerStore::new()), &AccountServiceConfig::default())
    }

    /// Wire every component to `store`
    pub fn with_store(store: Arc<dyn LedgerStore>, config: &AccountServiceConfig) -> Self {
        let mut provisioning =
            ProvisioningWorkflow::new(store.clone(), config.onboarding_account_types.clone());

        if let Some(url) = &config.referral_service_url {
            info!("Referral codes will be requested from {}", url);
            let client: Arc<dyn ReferralClient> = Arc::new(HttpReferralClient::new(url.clone()));
            provisioning = provisioning.with_referrals(ReferralNotifier::new(client));
        }

        Self {
            engine: BalanceEngine::with_max_attempts(store.clone(), config.balance_max_attempts),
            query: BalanceQuery::new(store.clone()),
            provisioning,
            store,
        }
    }

    /// Create a new ledger service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType, config: &AccountServiceConfig) -> Result<Self> {
        let store: Arc<dyn LedgerStore> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryLedgerStore::new()),
            RepositoryType::Postgres => Arc::new(PostgresLedgerStore::with_config(config).await?),
        };

        Ok(Self::with_store(store, config))
    }

    /// Create a new ledger service on PostgreSQL with a configuration
    pub async fn with_config(config: &AccountServiceConfig) -> Result<Self> {
        Self::with_repository(RepositoryType::Postgres, config).await
    }

    /// Replace the referral collaborator
    pub fn with_referral_client(self, client: Arc<dyn ReferralClient>) -> Self {
        let provisioning = self.provisioning.with_referrals(ReferralNotifier::new(client));
        Self { provisioning, ..self }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn referrals(&self) -> Option<&ReferralNotifier> {
        self.provisioning.referrals()
    }

    /// Start retrying parked referral requests; `None` without a referral service
    pub fn spawn_referral_replay(&self, every: Duration) -> Option<JoinHandle<()>> {
        self.referrals().map(|referrals| referrals.spawn_replay(every))
    }

    /// Create a user with its onboarding accounts
    pub async fn create_user(&self, username: &str, password: &str) -> Result<ProvisionedUser> {
        self.provisioning.create_user(username, password).await
    }

    /// Open an additional account for an existing user
    pub async fn open_account(&self, user_id: Uuid, account_type: AccountType) -> Result<Account> {
        self.provisioning.open_account(user_id, account_type).await
    }

    /// All accounts of a user
    pub async fn get_accounts_by_user(&self, user_id: Uuid) -> Result<Vec<Account>> {
        self.store
            .find_accounts_by_user(user_id)
            .await
            .with_context(|| format!("Failed to list accounts of user {}", user_id))
    }

    /// Current balance of an account
    pub async fn get_balance(&self, account_id: Uuid) -> Result<Balance> {
        self.query.get_balance(account_id).await
    }

    /// Add a signed delta to the balance of an account
    pub async fn adjust_balance(&self, account_id: Uuid, delta: Amount) -> Result<Balance> {
        info!("Adjusting balance of account {} by {}", account_id, delta);
        self.engine.adjust(account_id, delta).await
    }

    /// Whether an account holds at least `required`
    pub async fn has_sufficient_balance(&self, account_id: Uuid, required: Amount) -> Result<bool> {
        self.query.has_sufficient_balance(account_id, required).await
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
