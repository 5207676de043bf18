//! Marketing autopilot (mkat-ap) - main entry point
//!
//! Serves the cycle trigger API and, when configured, runs the cycle on an
//! in-process schedule.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mkat_ap::config::{Args, Config};
use mkat_ap::{build_router, scheduler, AppState};
use mkat_common::config::DataFolderInitializer;

fn init_tracing(config: &Config) -> Result<()> {
    let default_filter = format!(
        "mkat_ap={level},mkat_common={level},tower_http=info",
        level = config.log_level
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(&args);

    init_tracing(&config)?;

    info!(
        "Starting mkat-ap v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Data folder: {}", config.data_folder.display());

    let initializer = DataFolderInitializer::new(config.data_folder.clone());
    initializer
        .ensure_directory_exists()
        .context("Failed to create data folder")?;
    if !initializer.database_exists() {
        info!("Creating new database at {}", config.database_path.display());
    }

    let pool = mkat_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready: {}", config.database_path.display());

    if config.trigger_secret.is_none() {
        warn!("No trigger secret configured; /autopilot routes are unauthenticated");
    }

    let state = AppState::new(pool, config.trigger_secret.clone());

    let scheduler_handle = config
        .schedule_interval
        .map(|every| scheduler::spawn(state.clone(), every))
        .transpose()
        .context("Failed to start autopilot scheduler")?;

    let app = build_router(state);

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
