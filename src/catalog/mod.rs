// ============================================================================
// Product Catalog - Client side of the external product service
// ============================================================================
//
// The catalog owns products. This service only ever sees request scoped
// copies (id, name, price) returned by `ProductCatalog::resolve`.
//
// ============================================================================

mod nats;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::order::{Product, ProductId};

pub use nats::NatsProductCatalog;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Products not found: {0:?}")]
    ProductNotFound(Vec<ProductId>),

    #[error("Product catalog unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid product catalog response: {0}")]
    InvalidResponse(String),
}

/// Batch product lookup against the remote catalog.
///
/// Implementations return exactly one product per requested id, in request
/// order, duplicates included. Nothing is cached between calls.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn resolve(&self, product_ids: &[ProductId]) -> Result<Vec<Product>, CatalogError>;
}

/// Line up the catalog's answer with the ids that were asked for.
pub(crate) fn match_requested(
    requested: &[ProductId],
    returned: Vec<Product>,
) -> Result<Vec<Product>, CatalogError> {
    if let Some(product) = returned.iter().find(|p| p.price.is_sign_negative()) {
        return Err(CatalogError::InvalidResponse(format!(
            "product {} has a negative price",
            product.id
        )));
    }

    let by_id: HashMap<ProductId, Product> =
        returned.into_iter().map(|product| (product.id, product)).collect();

    let mut missing: Vec<ProductId> = requested
        .iter()
        .copied()
        .filter(|id| !by_id.contains_key(id))
        .collect();

    if !missing.is_empty() {
        missing.sort_unstable();
        missing.dedup();
        return Err(CatalogError::ProductNotFound(missing));
    }

    Ok(requested.iter().map(|id| by_id[id].clone()).collect())
}
