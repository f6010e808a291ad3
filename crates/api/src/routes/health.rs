//! Liveness endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub active_warehouses: Option<usize>,
}

/// GET /health: `degraded` with 503 when the warehouse store cannot be read.
pub async fn check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION");
    match state.engine.warehouses().list(true).await {
        Ok(warehouses) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                version,
                active_warehouses: Some(warehouses.len()),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not read warehouses");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    version,
                    active_warehouses: None,
                }),
            )
        }
    }
}
