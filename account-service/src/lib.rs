//! Account service: user provisioning and per-account balances

pub mod balance;
pub mod config;
pub mod password;
pub mod provisioning;
pub mod referral;
pub mod repository;
pub mod seed;
pub mod service;

pub use balance::{BalanceEngine, BalanceQuery};
pub use config::{AccountServiceConfig, AppEnv};
pub use provisioning::{ProvisionedUser, ProvisioningWorkflow};
pub use referral::{HttpReferralClient, Referral, ReferralBacklog, ReferralClient, ReferralNotifier};
pub use repository::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, RowCounts};
pub use service::{LedgerService, RepositoryType};
