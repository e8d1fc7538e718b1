mod auth;
mod body;
mod config;
mod error;
mod routes;

use auth::Authenticator;
use clap::Parser;
use config::Args;
use routes::AppState;
use sms_gateway::{GatewayOperations, SqliteLogStore, SshConnector};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let device = args.device_config()?;

    info!("SMS gateway starting");
    info!("  Device: {}:{}", device.host, device.port);
    info!("  Database: {}", args.database.display());
    warn!("Device host keys are accepted without verification; deploy on a trusted network only");

    let store = Arc::new(SqliteLogStore::open(&args.database)?);
    let connector = Arc::new(SshConnector::new(device));
    let ops = GatewayOperations::new(connector, store);

    let state = AppState::new(ops, Authenticator::new(&args.api_key));
    let app = routes::router(state);

    let listener = TcpListener::bind(args.bind).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
