//! Travel booking API server binary
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin travel-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin travel-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `API_LOG_JSON` - Emit JSON log lines (default: false)
//! * `API_DEFAULT_CURRENCY` - Currency for amounts submitted without one (default: USD)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::SystemClock;
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresBookingAdapter, PostgresCatalogAdapter,
    PostgresPaymentAdapter, PostgresUserAdapter,
};
use interface_api::{config::ApiConfig, create_router, AppState, Ports};

/// Initializes logging, loads configuration, connects and migrates the
/// database, then serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading configuration")?;

    init_tracing(&config.log_level, config.log_json);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting travel booking API server"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone()).max_connections(config.db_max_connections),
    )
    .await
    .context("connecting to database")?;

    run_migrations(&pool).await.context("running migrations")?;

    let ports = Ports {
        users: Arc::new(PostgresUserAdapter::new(pool.clone())),
        catalog: Arc::new(PostgresCatalogAdapter::new(pool.clone())),
        bookings: Arc::new(PostgresBookingAdapter::new(pool.clone())),
        payments: Arc::new(PostgresPaymentAdapter::new(pool)),
    };
    let state = AppState::new(ports, Arc::new(SystemClock), config.clone())
        .context("invalid default currency")?;

    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
