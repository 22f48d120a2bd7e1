// ============================================================================
// Marketplace Server - Listing Ownership and Message Routing
// ============================================================================
//
// Keeps buyer/seller conversations reachable while organization members come
// and go:
// - lifecycle: member removal / reactivation / role changes, listing transfer
// - routing: live recipient resolution and conversation ownership propagation
// - store: transactional storage (PostgreSQL or in-memory)
// - facade: operation surface used by the HTTP routes
//
// ============================================================================

pub mod audit;
pub mod context;
pub mod db;
pub mod facade;
pub mod lifecycle;
pub mod notifications;
pub mod routes;
pub mod routing;
pub mod store;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplace_config::{Config, LogFormat, StorageBackend};

use context::AppContext;
use facade::MessagingFacade;
use store::{InMemoryStore, MarketplaceStore, PostgresStore};

/// Initialize the global tracing subscriber
pub fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(config.rust_log.clone());
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

/// Open the configured store, applying migrations for PostgreSQL
pub async fn build_store(config: &Config) -> Result<Arc<dyn MarketplaceStore>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when STORAGE_BACKEND=postgres")?;

            info!("Connecting to database...");
            let pool = db::create_pool(database_url, &config.db).await?;
            info!("Connected to database");

            info!("Applying database migrations...");
            db::run_migrations(&pool).await?;
            info!("Database migrations applied successfully");

            Ok(Arc::new(PostgresStore::new(pool)))
        }
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

/// Run the HTTP server until a shutdown signal arrives
pub async fn run(config: Config) -> Result<()> {
    info!("=== Marketplace Server Starting ===");
    info!("Port: {}", config.port);

    let store = build_store(&config).await?;
    let notifier = notifications::notifier_from_config(&config.notifications)
        .context("Failed to initialize notifier")?;

    let facade = Arc::new(MessagingFacade::new(store, notifier));
    let app_context = Arc::new(AppContext::new(facade, config.storage_backend));
    let app = routes::create_router(app_context);

    info!("Marketplace Server listening on {}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to start server")?;

    info!("Marketplace Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received, draining connections");
}
