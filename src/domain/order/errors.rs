use uuid::Uuid;

use super::value_objects::{OrderStatus, ProductId};
use crate::catalog::CatalogError;
use crate::store::StoreError;

// ============================================================================
// Order Errors
// ============================================================================

/// Input rejected at the boundary, before any orchestration happens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid product id: {0}")]
    InvalidProductId(ProductId),

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("Invalid id, expected a UUID: {0}")]
    InvalidId(String),

    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("limit must not exceed {max}")]
    LimitTooLarge { max: u32 },

    #[error("Order totals overflow")]
    TotalsOverflow,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Order with id {0} not found")]
    NotFound(Uuid),

    /// Generic fault returned for any failure while creating an order.
    /// The underlying cause is logged, never returned.
    #[error("Something went wrong. Check logs")]
    CreationFailed,

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Transition from {from} to {to} is not allowed")]
    TransitionNotAllowed { from: OrderStatus, to: OrderStatus },

    #[error("Order {0} was modified concurrently")]
    StatusConflict(Uuid),

    #[error("Request timed out")]
    Timeout,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation",
            OrderError::NotFound(_) => "order_not_found",
            OrderError::CreationFailed => "creation_failed",
            OrderError::Catalog(CatalogError::ProductNotFound(_)) => "product_not_found",
            OrderError::Catalog(CatalogError::Unavailable(_)) => "catalog_unavailable",
            OrderError::Catalog(CatalogError::InvalidResponse(_)) => "catalog_invalid_response",
            OrderError::TransitionNotAllowed { .. } => "transition_not_allowed",
            OrderError::StatusConflict(_) => "status_conflict",
            OrderError::Timeout => "timeout",
            OrderError::Store(_) => "store",
        }
    }
}
