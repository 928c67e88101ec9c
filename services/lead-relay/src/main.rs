// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead Relay Service
//!
//! Receives leads from client websites and notifies the client by email and
//! SMS at the same time.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health`: storage health check
//! - `POST /api/v1/leads/:id`: submit a lead for client `id`
//! - `GET /metrics`: Prometheus metrics
//!
//! ## Configuration
//!
//! Configuration is loaded from `.env` and environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `THROTTLE_TTL`: Seconds to replenish one request permit (default: 60)
//! - `THROTTLE_LIMIT`: Burst size per client IP (default: 10)
//! - `AZURE_URL`: `endpoint=...;accesskey=...` connection string (required)
//! - `EMAIL_FROM`, `SMS_FROM`: sender identities (required)
//! - `DATABASE_URL`: SurrealDB endpoint (default: embedded in-memory)
//! - `SHUTDOWN_TIMEOUT_SECS`: Drain limit for in-flight requests (default: 5)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lead_relay::{
    config::Config,
    db::Database,
    handlers::AppState,
    limiter::AdmissionGate,
    metrics::Metrics,
    notify::{
        azure::{AzureEmail, AzureSms, ConnectionString},
        Dispatcher,
    },
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        throttle_ttl_secs = config.throttle.ttl_secs,
        throttle_limit = config.throttle.limit,
        database_url = %config.database.url,
        "Starting lead relay"
    );

    if let Err(e) = ConnectionString::parse(&config.provider.connection_string) {
        warn!(error = %e, "AZURE_URL is not a valid connection string; deliveries will fail");
    }

    // Storage
    let db = Database::connect(&config.database).await?;
    if let Some(path) = &config.database.clients_file {
        db.seed_clients(path).await?;
    }

    // Notification channels
    let http = reqwest::Client::builder()
        .timeout(config.provider.timeout())
        .build()?;
    let dispatcher = Dispatcher::new(
        AzureEmail::new(http.clone(), config.provider.connection_string.clone()),
        AzureSms::new(http, config.provider.connection_string.clone()),
        config.provider.timeout(),
    );

    let state = Arc::new(AppState {
        gate: AdmissionGate::new(&config.throttle),
        dispatcher,
        db,
        metrics: Metrics::new()?,
        config: config.clone(),
    });

    server::spawn_eviction(state.clone());

    let app = server::router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    server::serve(
        listener,
        app,
        server::shutdown_signal(),
        config.http.shutdown_timeout(),
    )
    .await?;

    info!("Server stopped");
    Ok(())
}
