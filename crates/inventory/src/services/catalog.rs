//! Product catalog port and in-memory implementation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ProductId, VariantId};
use domain::{InventoryError, Result};
use tokio::sync::RwLock;

/// Answers whether a product (and variant) exists before it is stocked.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn exists(&self, product_id: ProductId, variant_id: Option<VariantId>) -> Result<bool>;
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashSet<(ProductId, Option<VariantId>)>,
    accept_all: bool,
    fail: bool,
}

/// In-memory product catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryProductCatalog {
    /// Creates a catalog that knows no products.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog that accepts every product.
    pub fn accept_all() -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState {
                accept_all: true,
                ..Default::default()
            })),
        }
    }

    pub async fn register(&self, product_id: ProductId, variant_id: Option<VariantId>) {
        self.state
            .write()
            .await
            .products
            .insert((product_id, variant_id));
    }

    /// Makes every lookup fail, as if the catalog were unreachable.
    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn exists(&self, product_id: ProductId, variant_id: Option<VariantId>) -> Result<bool> {
        let state = self.state.read().await;
        if state.fail {
            return Err(InventoryError::Collaborator(
                "product catalog unavailable".to_string(),
            ));
        }
        Ok(state.accept_all || state.products.contains(&(product_id, variant_id)))
    }
}
