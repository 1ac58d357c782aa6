//! # Kosan Pekanbaru API Server
//!
//! Serves the REST API under `/api`, the payment webhook, and (optionally)
//! the pre-built client behind the dashboard page guard.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p kosan-api
//! ```
//!
//! Set `LOG_FORMAT=json` for structured log lines and `RUST_LOG` to
//! override the default filter.

use std::sync::Arc;

use anyhow::Context;
use kosan_api::{
    app::{build_router, AppState},
    config::Config,
    payment::midtrans::MidtransSnap,
};
use kosan_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Kosan API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let gateway = MidtransSnap::new(&config.midtrans).context("Failed to build payment client")?;
    tracing::info!(
        production = config.midtrans.is_production,
        verify_signature = config.midtrans.verify_signature,
        "Payment gateway configured"
    );

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config, Arc::new(gateway)));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kosan_api=debug,kosan_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
