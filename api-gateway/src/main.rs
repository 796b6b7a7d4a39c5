//! Ledger RPC server

use std::sync::Arc;

use account_service::seed::seed_local_data;
use account_service::{AccountServiceConfig, LedgerService, LedgerStore, PostgresLedgerStore};
use api_gateway::config::GatewayConfig;
use api_gateway::{app, AppState};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Account ledger RPC server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address; overrides PORT
    #[clap(short, long)]
    addr: Option<String>,

    /// Log directives, e.g. `info,api_gateway=debug`
    #[clap(short, long, env = "RUST_LOG", default_value = "info,tower_http=debug,api_gateway=debug")]
    log: String,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let args = Args::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(&args.log);

    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if let Err(e) = run(args).await {
        error!("Gateway stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut gateway = GatewayConfig::from_env()?;
    if let Some(addr) = args.addr {
        gateway.addr = addr.parse()?;
    }

    let config = AccountServiceConfig::from_env()?;
    debug!("Account service configuration: {:?}", config.pool);

    let store = Arc::new(PostgresLedgerStore::with_config(&config).await?);

    if config.is_local() {
        common::db::run_migrations(store.pool()).await?;
        if seed_local_data(store.as_ref()).await? {
            info!("Seeded local admin user");
        }
    }

    let store: Arc<dyn LedgerStore> = store;
    let ledger = Arc::new(LedgerService::with_store(store, &config));
    if ledger.spawn_referral_replay(config.referral_replay_interval).is_some() {
        info!(
            "Retrying parked referral requests every {}s",
            config.referral_replay_interval.as_secs()
        );
    }

    let state = Arc::new(AppState {
        ledger,
        request_timeout: gateway.request_timeout,
    });

    let listener = TcpListener::bind(gateway.addr).await?;
    info!("Listening on {}", gateway.addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
