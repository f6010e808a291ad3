//! Manual triggers for scheduled maintenance.

use axum::Json;
use axum::extract::State;
use inventory::SweepReport;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /maintenance/sweep: expires overdue reservations now.
#[tracing::instrument(skip(state))]
pub async fn sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, ApiError> {
    Ok(Json(state.engine.sweep_expired().await?))
}
