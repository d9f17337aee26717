//! The Santim Sentry API server binary.

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use santim_sentry::{
    build_router, config::ServerConfig, graceful_shutdown, AdvisorSettings, AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    let db_connection =
        Connection::open(&config.database_path).expect("Could not open the database file.");

    let app_state = AppState::new(
        db_connection,
        &config.jwt_secret,
        Duration::from_millis(config.payment_delay_ms),
        AdvisorSettings {
            endpoint: config.advisor_endpoint.clone(),
            api_key: config.advisor_api_key.clone(),
        },
    )
    .expect("Could not initialize the application state.");

    if config.advisor_api_key.is_none() {
        tracing::warn!("No advisor API key configured; the tips endpoint will be unavailable.");
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Santim Sentry API listening on {}", addr);

    axum_server::bind(addr)
        .handle(handle)
        .serve(build_router(app_state).into_make_service())
        .await
        .expect("The server failed to start.");
}
