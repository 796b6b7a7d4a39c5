//! Transaction handling for database operations
//!
//! Multi-row writes go through a [`LedgerTransaction`]. Dropping one without
//! calling [`LedgerTransaction::commit`] rolls it back, so a cancelled request
//! can never leave half of a provisioning batch behind.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};

use crate::error::Result;

/// A PostgreSQL transaction
pub struct LedgerTransaction {
    tx: SqlxTransaction<'static, Postgres>,
}

impl LedgerTransaction {
    /// Create a new LedgerTransaction
    pub fn new(tx: SqlxTransaction<'static, Postgres>) -> Self {
        Self { tx }
    }

    /// Execute a query within this transaction
    pub async fn execute<'a, E>(&mut self, query: E) -> Result<u64>
    where
        E: sqlx::Execute<'a, Postgres> + Send + 'a,
    {
        use sqlx::Executor;
        let result = (&mut *self.tx).execute(query).await?;
        Ok(result.rows_affected())
    }

    /// Fetch an optional row within this transaction
    pub async fn fetch_optional<'a, E>(&mut self, query: E) -> Result<Option<sqlx::postgres::PgRow>>
    where
        E: sqlx::Execute<'a, Postgres> + Send + 'a,
    {
        use sqlx::Executor;
        Ok((&mut *self.tx).fetch_optional(query).await?)
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Rollback the transaction
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Transaction manager trait for creating and managing transactions
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<LedgerTransaction>;
}

/// A PostgreSQL transaction manager implementation
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    /// Create a new PgTransactionManager
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin_transaction(&self) -> Result<LedgerTransaction> {
        let tx = self.pool.begin().await?;
        Ok(LedgerTransaction::new(tx))
    }
}
