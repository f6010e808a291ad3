//! Inventory item endpoints: lifecycle, manual adjustments and ledger views.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use common::{ItemId, ProductId, WarehouseId};
use domain::{
    DEFAULT_PAGE_SIZE, InventoryItem, ItemFilter, ItemUpdate, NewInventoryItem, Page, StockStatus,
};
use inventory::{AdjustStockRequest, ReconcileReport};
use ledger::{MovementQuery, MovementType, StockMovement};
use serde::Deserialize;

use super::{actor, page_request, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_MOVEMENT_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListItemsParams {
    pub warehouse_id: Option<WarehouseId>,
    pub product_id: Option<ProductId>,
    pub status: Option<StockStatus>,
    pub sku: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementParams {
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    pub newest_first: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// POST /items: creates an item and records its initial stock.
#[tracing::instrument(skip(state, headers, req), fields(product_id = %req.product_id, warehouse_id = %req.warehouse_id))]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewInventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let item = state.engine.create_item(req, &actor(&headers)).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<Page<InventoryItem>>, ApiError> {
    let page = page_request(params.limit, params.offset, DEFAULT_PAGE_SIZE);
    if let Some(sku) = params.sku.as_deref() {
        let matches = state.engine.items().find_by_sku(sku).await?;
        return Ok(Json(page.apply(matches)));
    }

    let filter = ItemFilter {
        warehouse_id: params.warehouse_id,
        product_id: params.product_id,
        statuses: params.status.map(|s| vec![s]),
    };
    Ok(Json(state.engine.items().list(&filter, page).await?))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InventoryItem>, ApiError> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(state.engine.items().get(id).await?))
}

/// PATCH /items/{id}: thresholds and descriptive fields only.
#[tracing::instrument(skip(state, req))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ItemUpdate>,
) -> Result<Json<InventoryItem>, ApiError> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(state.engine.items().update(id, req).await?))
}

/// DELETE /items/{id}: refused while active reservations exist.
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: ItemId = parse_id(&id)?;
    state.engine.items().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /items/{id}/adjust: signed manual adjustment.
#[tracing::instrument(skip(state, req), fields(quantity = req.quantity))]
pub async fn adjust(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<(StatusCode, Json<StockMovement>), ApiError> {
    let id: ItemId = parse_id(&id)?;
    let movement = state.engine.adjust_stock(id, req).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// GET /items/{id}/movements
#[tracing::instrument(skip(state))]
pub async fn movements(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<MovementParams>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    let id: ItemId = parse_id(&id)?;
    let page = page_request(params.limit, params.offset, DEFAULT_MOVEMENT_LIMIT);
    let mut query = MovementQuery::new().limit(page.limit).offset(page.offset);
    if let Some(movement_type) = params.movement_type {
        query = query.movement_type(movement_type);
    }
    if params.newest_first {
        query = query.newest_first();
    }
    Ok(Json(state.engine.items().movements(id, query).await?))
}

/// POST /items/{id}/reconcile: corrects ledger drift with an adjustment.
#[tracing::instrument(skip(state, headers))]
pub async fn reconcile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ReconcileReport>, ApiError> {
    let id: ItemId = parse_id(&id)?;
    Ok(Json(state.engine.items().reconcile(id, &actor(&headers)).await?))
}
