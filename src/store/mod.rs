// ============================================================================
// Order Store - Durable storage for orders and their lines
// ============================================================================
//
// Orders and items are written together exactly once. After that the only
// mutable column is `status`, changed through a conditional write so that
// concurrent transitions on the same order are linearizable.
//
// ============================================================================

mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus, OrderWithItems, PricedItem};

pub use postgres::PostgresOrderStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Offset pagination window, `page` starts at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)).saturating_mul(i64::from(self.limit))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPage {
    pub orders: Vec<Order>,
    pub total: i64,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order and all of its items in one transaction
    async fn create_with_items(
        &self,
        total_amount: Decimal,
        total_items: i32,
        items: &[PricedItem],
    ) -> Result<OrderWithItems, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError>;

    /// Orders without items, oldest first, plus the count matching `status`
    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<StoredPage, StoreError>;

    /// Set `status` to `to` only if it is currently `from`.
    ///
    /// Returns `None` when the order does not exist or its status no longer
    /// matches `from`.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
}
