//! Warehouse registry endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::WarehouseId;
use domain::{NewWarehouse, Warehouse};
use inventory::WarehouseSummary;
use serde::Deserialize;

use super::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListWarehousesParams {
    #[serde(default)]
    pub active_only: bool,
}

/// POST /warehouses
#[tracing::instrument(skip(state, req), fields(code = %req.code))]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<NewWarehouse>,
) -> Result<(StatusCode, Json<Warehouse>), ApiError> {
    let warehouse = state.engine.warehouses().create(req).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

/// GET /warehouses, ordered by priority.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListWarehousesParams>,
) -> Result<Json<Vec<Warehouse>>, ApiError> {
    let warehouses = state.engine.warehouses().list(params.active_only).await?;
    Ok(Json(warehouses))
}

/// GET /warehouses/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Warehouse>, ApiError> {
    let id: WarehouseId = parse_id(&id)?;
    Ok(Json(state.engine.warehouses().get(id).await?))
}

/// GET /warehouses/{id}/summary: stock totals, utilization and status counts.
#[tracing::instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WarehouseSummary>, ApiError> {
    let id: WarehouseId = parse_id(&id)?;
    Ok(Json(state.engine.reports().warehouse_summary(id).await?))
}
