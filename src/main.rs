mod api;
mod config;
mod db;
mod error;
mod pricing;
mod scheduler;
mod types;

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::SqlitePool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, SHUTDOWN_GRACE_SECS};
use crate::db::{PriceStore, SqliteStore};
use crate::error::Result;
use crate::scheduler::{PriceScheduler, PriceUpdater};

#[tokio::main]
async fn main() {
    // .env is optional
    dotenv::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let sqlite = SqliteStore::connect(&cfg.db_path).await?;
    let pool = sqlite.pool().clone();
    info!("Database ready at {}", cfg.db_path);
    let store: Arc<dyn PriceStore> = Arc::new(sqlite);

    let cancel = CancellationToken::new();
    let health = Arc::new(HealthState::new());

    // --- Price scheduler ---
    let rng = match cfg.price_seed {
        Some(seed) => {
            info!(seed, "Price walk seeded deterministically");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let updater = PriceUpdater::new(Arc::clone(&store), rng, Arc::clone(&health));
    let scheduler = PriceScheduler::new(Arc::new(updater), cfg.interval());
    let scheduler_handle = tokio::spawn(scheduler.run(cancel.clone()));

    // --- Signal handling ---
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    // --- HTTP API server ---
    let app = router(ApiState { store, health });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await;

    finish(served, cancel, scheduler_handle, pool).await
}

/// Stops the scheduler and closes the pool whether or not serve failed, then
/// reports the serve outcome.
async fn finish(
    served: std::io::Result<()>,
    cancel: CancellationToken,
    scheduler_handle: JoinHandle<()>,
    pool: SqlitePool,
) -> Result<()> {
    if let Err(e) = &served {
        error!("HTTP server failed: {e}");
    }

    cancel.cancel();

    match tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), scheduler_handle).await {
        Ok(Ok(())) => info!("Price scheduler stopped"),
        Ok(Err(e)) => error!("Price scheduler task failed: {e}"),
        Err(_) => warn!("Price scheduler did not stop within {SHUTDOWN_GRACE_SECS}s"),
    }

    pool.close().await;
    info!("Graceful shutdown complete");
    Ok(served?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
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
}
