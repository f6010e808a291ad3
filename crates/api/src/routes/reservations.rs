//! Reservation endpoints, per reservation and per order.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::{OrderId, ReservationId};
use domain::StockReservation;
use inventory::{BulkOutcome, BulkReserveRequest, ReserveRequest};
use serde::Serialize;

use super::{actor, parse_id};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReleaseResponse {
    pub released: bool,
}

#[derive(Serialize)]
pub struct OrderReleaseResponse {
    pub order_id: OrderId,
    pub released: usize,
}

/// POST /reservations: one reservation per warehouse the request spans.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id, quantity = req.quantity))]
pub async fn reserve(
    State(state): State<AppState>,
    Json(req): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<Vec<StockReservation>>), ApiError> {
    let reservations = state.engine.reserve(req).await?;
    Ok((StatusCode::CREATED, Json(reservations)))
}

/// POST /reservations/bulk: lines succeed or fail independently.
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id, lines = req.lines.len()))]
pub async fn bulk_reserve(
    State(state): State<AppState>,
    Json(req): Json<BulkReserveRequest>,
) -> Result<Json<BulkOutcome<Vec<StockReservation>>>, ApiError> {
    Ok(Json(state.engine.reservations().bulk_reserve(req).await?))
}

/// GET /reservations/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StockReservation>, ApiError> {
    let id: ReservationId = parse_id(&id)?;
    Ok(Json(state.engine.reservations().get(id).await?))
}

/// POST /reservations/{id}/release: `released` is false when it was no longer active.
#[tracing::instrument(skip(state, headers))]
pub async fn release(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let id: ReservationId = parse_id(&id)?;
    let released = state.engine.release(id, &actor(&headers)).await?;
    Ok(Json(ReleaseResponse { released }))
}

/// POST /reservations/{id}/fulfill
#[tracing::instrument(skip(state, headers))]
pub async fn fulfill(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<StockReservation>, ApiError> {
    let id: ReservationId = parse_id(&id)?;
    Ok(Json(state.engine.fulfill(id, &actor(&headers)).await?))
}

/// GET /orders/{id}/reservations
#[tracing::instrument(skip(state))]
pub async fn for_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<StockReservation>>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    Ok(Json(state.engine.reservations().for_order(order_id).await?))
}

/// POST /orders/{id}/release: releases every active reservation of the order.
#[tracing::instrument(skip(state, headers))]
pub async fn release_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderReleaseResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let released = state
        .engine
        .reservations()
        .release_order(order_id, &actor(&headers))
        .await?;
    Ok(Json(OrderReleaseResponse { order_id, released }))
}

/// POST /orders/{id}/fulfill: fulfills every active reservation of the order.
#[tracing::instrument(skip(state, headers))]
pub async fn fulfill_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<StockReservation>>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let fulfilled = state
        .engine
        .reservations()
        .fulfill_order(order_id, &actor(&headers))
        .await?;
    Ok(Json(fulfilled))
}
