//! Cross-warehouse stock endpoints: transfers and availability checks.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use inventory::{Availability, AvailabilityRequest, TransferRequest, TransferResult};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /transfers
#[tracing::instrument(skip(state, req), fields(quantity = req.quantity))]
pub async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResult>), ApiError> {
    let result = state.engine.transfer(req).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /availability: per-warehouse stock plus an allocation suggestion.
#[tracing::instrument(skip(state, req), fields(product_id = %req.product_id, quantity = req.quantity))]
pub async fn availability(
    State(state): State<AppState>,
    Json(req): Json<AvailabilityRequest>,
) -> Result<Json<Availability>, ApiError> {
    Ok(Json(state.engine.check_availability(req).await?))
}
