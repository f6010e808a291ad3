//! Stock alert endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use common::{AlertId, ItemId, WarehouseId};
use domain::{AlertQuery, AlertSeverity, AlertType, DEFAULT_PAGE_SIZE, Page, StockAlert};
use inventory::AlertScanReport;
use serde::Deserialize;

use super::{page_request, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListAlertsParams {
    pub item_id: Option<ItemId>,
    pub warehouse_id: Option<WarehouseId>,
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    #[serde(default)]
    pub unread_only: bool,
    #[serde(default)]
    pub unresolved_only: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListAlertsParams> for AlertQuery {
    fn from(params: ListAlertsParams) -> Self {
        AlertQuery {
            item_id: params.item_id,
            warehouse_id: params.warehouse_id,
            alert_type: params.alert_type,
            severity: params.severity,
            unread_only: params.unread_only,
            unresolved_only: params.unresolved_only,
            page: page_request(params.limit, params.offset, DEFAULT_PAGE_SIZE),
        }
    }
}

/// POST /alerts/generate: runs one low and out-of-stock scan now.
#[tracing::instrument(skip(state))]
pub async fn generate(State(state): State<AppState>) -> Result<Json<AlertScanReport>, ApiError> {
    Ok(Json(state.engine.generate_alerts().await?))
}

/// GET /alerts, newest first.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListAlertsParams>,
) -> Result<Json<Page<StockAlert>>, ApiError> {
    let query = AlertQuery::from(params);
    Ok(Json(state.engine.alerts().list(&query).await?))
}

/// POST /alerts/{id}/read
#[tracing::instrument(skip(state))]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StockAlert>, ApiError> {
    let id: AlertId = parse_id(&id)?;
    Ok(Json(state.engine.alerts().mark_read(id).await?))
}

/// POST /alerts/{id}/resolve
#[tracing::instrument(skip(state))]
pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StockAlert>, ApiError> {
    let id: AlertId = parse_id(&id)?;
    Ok(Json(state.engine.alerts().resolve(id).await?))
}
