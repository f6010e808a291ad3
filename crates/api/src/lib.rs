//! HTTP API server for the multi-warehouse stock reservation engine.
//!
//! Exposes warehouses, items, reservations, transfers and alerts as JSON
//! endpoints, with structured logging (tracing), Prometheus metrics and a
//! per-client rate limiter.

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use inventory::{InMemoryOrderSystem, InMemoryProductCatalog, InventoryEngine};
use ledger::MovementStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use rate_limit::RateLimiter;
use state::AppState;

/// Creates the Axum application router with all routes and shared state.
///
/// `/health` and `/metrics` bypass the rate limiter.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let health_router = Router::new()
        .route("/health", get(routes::health::check))
        .with_state(state.clone());

    let api = Router::new()
        .route(
            "/warehouses",
            post(routes::warehouses::create).get(routes::warehouses::list),
        )
        .route("/warehouses/{id}", get(routes::warehouses::get))
        .route("/warehouses/{id}/summary", get(routes::warehouses::summary))
        .route("/items", post(routes::items::create).get(routes::items::list))
        .route(
            "/items/{id}",
            get(routes::items::get)
                .patch(routes::items::update)
                .delete(routes::items::delete),
        )
        .route("/items/{id}/adjust", post(routes::items::adjust))
        .route("/items/{id}/movements", get(routes::items::movements))
        .route("/items/{id}/reconcile", post(routes::items::reconcile))
        .route("/transfers", post(routes::stock::transfer))
        .route("/availability", post(routes::stock::availability))
        .route("/reservations", post(routes::reservations::reserve))
        .route("/reservations/bulk", post(routes::reservations::bulk_reserve))
        .route("/reservations/{id}", get(routes::reservations::get))
        .route("/reservations/{id}/release", post(routes::reservations::release))
        .route("/reservations/{id}/fulfill", post(routes::reservations::fulfill))
        .route("/orders/{id}/reservations", get(routes::reservations::for_order))
        .route("/orders/{id}/release", post(routes::reservations::release_order))
        .route("/orders/{id}/fulfill", post(routes::reservations::fulfill_order))
        .route("/alerts", get(routes::alerts::list))
        .route("/alerts/generate", post(routes::alerts::generate))
        .route("/alerts/{id}/read", post(routes::alerts::mark_read))
        .route("/alerts/{id}/resolve", post(routes::alerts::resolve))
        .route("/maintenance/sweep", post(routes::maintenance::sweep))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit::enforce,
        ))
        .with_state(state);

    Router::new()
        .merge(health_router)
        .merge(api)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Builds the engine over in-memory repositories and the given ledger.
///
/// The product catalog accepts every product and order notifications are
/// kept in memory; deployments with real collaborators build their own
/// [`InventoryEngine`] and wrap it in an [`AppState`].
pub fn create_default_state(
    config: &Config,
    ledger: Arc<dyn MovementStore>,
) -> Result<AppState, domain::InventoryError> {
    let engine = InventoryEngine::builder()
        .ledger(ledger)
        .in_memory_storage()
        .catalog(Arc::new(InMemoryProductCatalog::accept_all()))
        .orders(Arc::new(InMemoryOrderSystem::new()))
        .settings(config.engine_settings())
        .build()?;

    let limiter = RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window());
    Ok(AppState::new(engine, limiter))
}
