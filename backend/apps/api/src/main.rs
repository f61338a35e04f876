//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are rendered by the gate
//! crate.

mod config;

use axum::{Json, Router, routing::get};
use config::{ServerConfig, StorageConfig};
use gate::{HttpAccountLookup, JsonFileGateRepository, PgGateRepository, gate_router};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,gate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let ttl_ms = config.gate.challenge_ttl_ms();

    tracing::info!(
        user_daily_limit = config.gate.user_daily_limit,
        ip_daily_limit = config.gate.ip_daily_limit,
        admin_configured = config.gate.admin_id.is_some(),
        day_offset = %config.gate.day_offset,
        service_token = config.gate.service_token.is_some(),
        "Gate configuration loaded"
    );

    if config.gate.service_token.is_none() && !config.bind_addr.is_loopback() {
        tracing::warn!(
            bind_addr = %config.bind_addr,
            "GATE_SERVICE_TOKEN is unset; any caller that reaches the port can claim any identity"
        );
    }

    let lookup = Arc::new(HttpAccountLookup::new(
        config.lookup.base_url.clone(),
        config.lookup.timeout,
        config.lookup.max_concurrent,
    )?);

    tracing::info!(url = %lookup.base_url(), "Account lookup service configured");

    let gate = match config.storage {
        StorageConfig::Postgres { database_url } => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let repo = PgGateRepository::new(pool);

            // Errors here should not prevent server startup
            if let Err(e) = repo.cleanup_expired(ttl_ms).await {
                tracing::warn!(error = %e, "Challenge cleanup failed, continuing anyway");
            }

            gate_router(Arc::new(repo), lookup, config.gate)
        }
        StorageConfig::JsonFiles { dir } => {
            let repo = JsonFileGateRepository::open(dir).await?;

            if let Err(e) = repo.purge_expired(ttl_ms).await {
                tracing::warn!(error = %e, "Challenge cleanup failed, continuing anyway");
            }

            gate_router(Arc::new(repo), lookup, config.gate)
        }
    };

    let started = Instant::now();

    // Build router
    let app = Router::new()
        .route("/health", get(move || health(started)))
        .nest("/api/gate", gate)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::new(config.bind_addr, config.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn health(started: Instant) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptimeSecs": started.elapsed().as_secs(),
    }))
}
