//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use ledger::{InMemoryMovementStore, MovementStore, PostgresMovementStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// PostgreSQL ledger when `DATABASE_URL` is set, in-memory otherwise.
async fn connect_ledger(config: &Config) -> Arc<dyn MovementStore> {
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            let store = PostgresMovementStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run ledger migrations");
            tracing::info!("using PostgreSQL movement ledger");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, movement ledger is in-memory");
            Arc::new(InMemoryMovementStore::new())
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the ledger and the engine
    let ledger = connect_ledger(&config).await;
    let state = api::create_default_state(&config, ledger).expect("failed to build inventory engine");

    // 4. Start expiry sweep and alert scan
    let scheduler = state
        .engine
        .scheduler(config.sweep_interval(), config.alert_scan_interval())
        .start();

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    scheduler.shutdown().await;
    tracing::info!("server shut down gracefully");
}
