// ============================================================================
// Test Doubles - In-memory stand-ins for the database and the catalog
// ============================================================================

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

use crate::catalog::{match_requested, CatalogError, ProductCatalog};
use crate::domain::order::{Order, OrderItem, OrderStatus, OrderWithItems, PricedItem, Product, ProductId};
use crate::store::{OrderStore, PageRequest, StoreError, StoredPage};

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<Vec<OrderWithItems>>,
    fail_writes: AtomicBool,
    status_writes: AtomicUsize,
    interleaved: Mutex<Option<(Uuid, OrderStatus)>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Simulate another writer changing `id` to `status` right before the
    /// next conditional status update
    pub fn interleave_status(&self, id: Uuid, status: OrderStatus) {
        *self.interleaved.lock().unwrap() = Some((id, status));
    }

    fn injected_failure() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_with_items(
        &self,
        total_amount: Decimal,
        total_items: i32,
        items: &[PricedItem],
    ) -> Result<OrderWithItems, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }

        let order_id = Uuid::now_v7();
        let created = OrderWithItems {
            order: Order {
                id: order_id,
                status: OrderStatus::default(),
                total_amount,
                total_items,
                created_at: Utc::now(),
            },
            items: items
                .iter()
                .map(|item| OrderItem {
                    id: Uuid::now_v7(),
                    order_id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
        };

        self.orders.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order.id == id)
            .cloned())
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<StoredPage, StoreError> {
        let orders = self.orders.lock().unwrap();
        let matching: Vec<Order> = orders
            .iter()
            .map(|o| o.order.clone())
            .filter(|o| status.map_or(true, |s| o.status == s))
            .collect();

        let total = matching.len() as i64;
        let orders = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok(StoredPage { orders, total })
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected_failure());
        }

        let interleaved = self.interleaved.lock().unwrap().take();
        let mut orders = self.orders.lock().unwrap();

        if let Some((other_id, other_status)) = interleaved {
            if let Some(o) = orders.iter_mut().find(|o| o.order.id == other_id) {
                o.order.status = other_status;
            }
        }

        match orders.iter_mut().find(|o| o.order.id == id && o.order.status == from) {
            Some(o) => {
                o.order.status = to;
                self.status_writes.fetch_add(1, Ordering::SeqCst);
                Ok(Some(o.order.clone()))
            }
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct StaticCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
    failure: Mutex<Option<CatalogError>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, id: ProductId, name: &str, price: Decimal) -> Self {
        self.set_product(id, name, price);
        self
    }

    pub fn set_product(&self, id: ProductId, name: &str, price: Decimal) {
        self.products.lock().unwrap().insert(
            id,
            Product {
                id,
                name: name.to_string(),
                price,
            },
        );
    }

    pub fn fail_with(&self, err: CatalogError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Delay every later lookup by `delay`
    pub fn respond_after(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for StaticCatalog {
    async fn resolve(&self, product_ids: &[ProductId]) -> Result<Vec<Product>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }

        let known: Vec<Product> = {
            let products = self.products.lock().unwrap();
            product_ids
                .iter()
                .filter_map(|id| products.get(id).cloned())
                .collect()
        };

        match_requested(product_ids, known)
    }
}
