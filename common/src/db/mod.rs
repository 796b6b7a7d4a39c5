use std::path::PathBuf;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};
use tracing::info;

use crate::error::{Error, Result};

pub mod models;
pub mod queries;
pub mod transaction;

// Re-export transaction types
pub use transaction::{LedgerTransaction, PgTransactionManager, TransactionManager};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Bounds on the shared connection pool
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// Maximum open connections
    pub max_connections: u32,
    /// Connections older than this are closed
    pub max_lifetime: Duration,
    /// Idle connections are closed after this long
    pub idle_timeout: Duration,
    /// How long a caller waits for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            max_lifetime: Duration::from_secs(60 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Initialize the database connection pool and make sure it answers
pub async fn init_db_pool(database_url: &str, settings: &PoolSettings) -> Result<DbPool> {
    info!(
        "Connecting to PostgreSQL with max {} connections",
        settings.max_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .max_lifetime(settings.max_lifetime)
        .idle_timeout(settings.idle_timeout)
        .acquire_timeout(settings.acquire_timeout)
        .test_before_acquire(true)
        .connect(database_url)
        .await
        .map_err(|e| Error::Unavailable(format!("failed to connect to postgres: {}", e)))?;

    ping(&pool).await?;
    info!("Connected to PostgreSQL database");

    Ok(pool)
}

/// Round-trip a trivial statement
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(|e| Error::Unavailable(format!("could not ping database: {}", e)))?;
    Ok(())
}

/// Directory holding the SQL migrations
pub fn migrations_dir() -> Result<PathBuf> {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|root| root.join("migrations"))
        .ok_or_else(|| Error::ConfigurationError("cannot locate migrations directory".to_string()))
}

/// Run migrations on the database
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrations_path = migrations_dir()?;

    sqlx::migrate::Migrator::new(migrations_path)
        .await?
        .run(pool)
        .await?;

    info!("Database migrations applied");
    Ok(())
}
