use account_service::seed::seed_local_data;
use account_service::{AccountServiceConfig, PostgresLedgerStore};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ledger administration CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database URL (defaults to DATABASE_URL)
    #[arg(short, long)]
    database_url: Option<String>,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create the admin user with one account of every type
    Seed,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "account_service={level},common={level}",
            level = cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> common::Result<()> {
    let mut config = AccountServiceConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let store = PostgresLedgerStore::with_config(&config).await?;

    match cli.command {
        Commands::Migrate => {
            common::db::run_migrations(store.pool()).await?;
        }
        Commands::Seed => {
            if seed_local_data(&store).await? {
                info!("Seed data created");
            }
        }
    }

    Ok(())
}
