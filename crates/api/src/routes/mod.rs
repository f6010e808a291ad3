//! HTTP route handlers, one module per resource.

pub mod alerts;
pub mod health;
pub mod items;
pub mod maintenance;
pub mod metrics;
pub mod reservations;
pub mod stock;
pub mod warehouses;

use axum::http::HeaderMap;
use domain::PageRequest;
use uuid::Uuid;

use crate::error::ApiError;

/// Header naming who performs a mutation; recorded on ledger movements.
pub const ACTOR_HEADER: &str = "x-actor";

const DEFAULT_ACTOR: &str = "system";

fn actor(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
        .to_string()
}

fn parse_id<T: From<Uuid>>(id: &str) -> Result<T, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(T::from(uuid))
}

fn page_request(limit: Option<usize>, offset: Option<usize>, default_limit: usize) -> PageRequest {
    PageRequest::new(limit.unwrap_or(default_limit), offset.unwrap_or_default())
}
