//! verifinow-gateway server.
//!
//! Reads `VERIFINOW__*` configuration, connects the record store and serves
//! `POST /api/webhooks/verifinow` until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use verifinow_gateway::adapters::events::{
    InProcessEventBus, LogVerificationCompleted, LogVerificationFailed,
    VERIFICATION_COMPLETED_V1, VERIFICATION_FAILED_V1,
};
use verifinow_gateway::adapters::http::{webhook_router, WebhookAppState};
use verifinow_gateway::adapters::postgres::PostgresVerificationStore;
use verifinow_gateway::adapters::storage::InMemoryVerificationStore;
use verifinow_gateway::config::{AppConfig, DatabaseConfig, ServerConfig};
use verifinow_gateway::ports::{EventSubscriber, VerificationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.server);
    config.validate().context("invalid configuration")?;

    let verification_store = connect_store(config.database.as_ref()).await?;

    let event_bus = Arc::new(InProcessEventBus::new());
    event_bus.subscribe(VERIFICATION_COMPLETED_V1, Arc::new(LogVerificationCompleted));
    event_bus.subscribe(VERIFICATION_FAILED_V1, Arc::new(LogVerificationFailed));

    let mut app = Router::new();
    if config.webhook.register_routes {
        let state = WebhookAppState {
            verifier: Arc::new(config.webhook.verifier()),
            verification_store,
            event_publisher: event_bus,
        };
        app = app.merge(webhook_router(state));
        tracing::info!(
            replay_window_secs = config.webhook.replay_window_secs,
            "VerifyNow webhook route mounted at /api/webhooks/verifinow"
        );
    } else {
        tracing::warn!("VerifyNow webhook route disabled by configuration");
    }

    let app = app
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!(%addr, environment = ?config.server.environment, "verifinow-gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("verifinow-gateway stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if server.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect_store(
    database: Option<&DatabaseConfig>,
) -> anyhow::Result<Arc<dyn VerificationStore>> {
    let Some(database) = database else {
        tracing::warn!("No database configured; verification records are kept in memory");
        return Ok(Arc::new(InMemoryVerificationStore::new()));
    };

    let pool = database
        .pool_options()
        .connect(&database.url)
        .await
        .context("failed to connect to database")?;
    tracing::info!(max_connections = database.max_connections, "Connected to database");

    if database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run migrations")?;
        tracing::info!("Database migrations applied");
    }

    Ok(Arc::new(PostgresVerificationStore::new(pool)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
