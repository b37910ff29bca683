use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jma_forecast::common::AppState;
use jma_forecast::config::{Config, StorageMode};
use jma_forecast::jma::JmaClient;
use jma_forecast::routes;
use jma_forecast::services::store;
use jma_forecast::sync::initializer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jma_forecast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting jma-forecast...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        storage_mode = ?config.storage_mode,
        host = %config.api_host,
        port = config.api_port,
        "Configuration loaded"
    );

    let jma_client = JmaClient::new(&config)?;
    tracing::info!(area_url = %config.jma_area_url, "JMA client initialized");

    let db = match config.storage_mode {
        StorageMode::Database => {
            tracing::info!("Connecting to database...");
            let db = store::connect(&config.database_url).await?;
            store::ensure_schema(&db).await?;
            tracing::info!("Database ready");
            Some(db)
        }
        StorageMode::Memory => {
            tracing::info!("Running without a store, forecasts are fetched live");
            None
        }
    };

    let state = AppState::new(db, config.clone(), jma_client);

    // Populate the store before serving; failures leave it as it was
    if state.db.is_some() && config.sync_on_startup {
        match initializer::run(&state).await {
            Ok(report) => tracing::info!(?report, "Initial sync completed"),
            Err(e) => tracing::error!(error = %e, "Initial sync failed, serving stored data"),
        }
    }

    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
