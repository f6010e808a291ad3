//! Shared handler state.

use std::sync::Arc;

use inventory::InventoryEngine;

use crate::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub engine: InventoryEngine,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(engine: InventoryEngine, rate_limiter: RateLimiter) -> Self {
        Self {
            engine,
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}
