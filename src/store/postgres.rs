use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{OrderStore, PageRequest, StoreError, StoredPage};
use crate::domain::order::{Order, OrderItem, OrderStatus, OrderWithItems, PricedItem};

// ============================================================================
// PostgreSQL Order Store
// ============================================================================
//
// Tables:
//   orders      (id, status, total_amount, total_items, created_at)
//   order_items (id, order_id -> orders.id ON DELETE CASCADE,
//                product_id, quantity, price)
//
// Ids are UUIDv7, so ordering items by id keeps insertion order.
//
// ============================================================================

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        status TEXT NOT NULL DEFAULT 'PENDING'
            CHECK (status IN ('PENDING', 'PAID', 'DELIVERED', 'CANCELLED')),
        total_amount NUMERIC NOT NULL CHECK (total_amount >= 0),
        total_items INTEGER NOT NULL CHECK (total_items >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS orders_status_created_at_idx
        ON orders (status, created_at, id)",
    "CREATE TABLE IF NOT EXISTS order_items (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        product_id BIGINT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        price NUMERIC NOT NULL CHECK (price >= 0)
    )",
    "CREATE INDEX IF NOT EXISTS order_items_order_id_idx ON order_items (order_id)",
];

const ORDER_COLUMNS: &str = "id, status, total_amount, total_items, created_at";

pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes when they are missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!("Order schema ready");
        Ok(())
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::CorruptRow(e.to_string()))?;

    Ok(Order {
        id: row.try_get("id")?,
        status,
        total_amount: row.try_get("total_amount")?,
        total_items: row.try_get("total_items")?,
        created_at: row.try_get("created_at")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, StoreError> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
    })
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create_with_items(
        &self,
        total_amount: Decimal,
        total_items: i32,
        items: &[PricedItem],
    ) -> Result<OrderWithItems, StoreError> {
        let order_id = Uuid::now_v7();

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO orders (id, status, total_amount, total_items)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .bind(OrderStatus::default().as_str())
        .bind(total_amount)
        .bind(total_items)
        .fetch_one(&mut *tx)
        .await?;

        let order = order_from_row(&row)?;

        let mut stored_items = Vec::with_capacity(items.len());
        for item in items {
            let item_id = Uuid::now_v7();

            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item_id)
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;

            stored_items.push(OrderItem {
                id: item_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            });
        }

        tx.commit().await?;

        tracing::debug!(
            order_id = %order_id,
            item_count = stored_items.len(),
            "Persisted order with items"
        );

        Ok(OrderWithItems {
            order,
            items: stored_items,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderWithItems>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let order = match row {
            Some(row) => order_from_row(&row)?,
            None => return Ok(None),
        };

        let rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity, price
             FROM order_items
             WHERE order_id = $1
             ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(OrderWithItems { order, items }))
    }

    async fn find_page(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<StoredPage, StoreError> {
        let status = status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT {}
             FROM orders
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at ASC, id ASC
             LIMIT $2 OFFSET $3",
            ORDER_COLUMNS
        ))
        .bind(status)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StoredPage { orders, total })
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $1
             WHERE id = $2 AND status = $3
             RETURNING {}",
            ORDER_COLUMNS
        ))
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }
}

// ============================================================================
// Integration Tests (require a PostgreSQL instance in DATABASE_URL)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn connect() -> PostgresOrderStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();

        let store = PostgresOrderStore::new(pool);
        store.ensure_schema().await.unwrap();
        store
    }

    fn item(product_id: i64, quantity: i32, price: i64) -> PricedItem {
        PricedItem {
            product_id,
            quantity,
            price: Decimal::new(price, 2),
        }
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_create_then_find_round_trip() {
        let store = connect().await;
        let items = vec![item(1, 2, 1000), item(2, 1, 550)];

        let created = store
            .create_with_items(Decimal::new(2550, 2), 3, &items)
            .await
            .unwrap();
        let found = store.find_by_id(created.order.id).await.unwrap().unwrap();

        assert_eq!(found, created);
        assert_eq!(found.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_failed_item_insert_rolls_back_order() {
        let store = connect().await;
        let before = store.find_page(None, PageRequest { page: 1, limit: 1 }).await.unwrap();

        // quantity = 0 violates the CHECK on order_items
        let result = store
            .create_with_items(Decimal::new(1000, 2), 1, &[item(1, 1, 1000), item(2, 0, 100)])
            .await;
        assert!(result.is_err());

        let after = store.find_page(None, PageRequest { page: 1, limit: 1 }).await.unwrap();
        assert_eq!(before.total, after.total);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL"]
    async fn test_compare_and_set_requires_expected_status() {
        let store = connect().await;
        let created = store
            .create_with_items(Decimal::new(100, 2), 1, &[item(9, 1, 100)])
            .await
            .unwrap();
        let id = created.order.id;

        let stale = store
            .compare_and_set_status(id, OrderStatus::Paid, OrderStatus::Delivered)
            .await
            .unwrap();
        assert!(stale.is_none());

        let updated = store
            .compare_and_set_status(id, OrderStatus::Pending, OrderStatus::Paid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);
    }
}
