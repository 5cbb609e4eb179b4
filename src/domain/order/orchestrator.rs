use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use super::aggregate::OrderAggregateBuilder;
use super::errors::OrderError;
use super::policy::{EnrichmentPolicy, TransitionPolicy};
use super::value_objects::*;
use crate::catalog::ProductCatalog;
use crate::metrics::Metrics;
use crate::store::{OrderStore, PageRequest};

// ============================================================================
// Order Orchestrator
// ============================================================================
//
// Orchestrates: request → catalog → builder → store → enrichment
//
// Creation collapses every failure into `OrderError::CreationFailed`; the
// real cause is logged and counted. Reads pass catalog errors through.
// An optional creation deadline drops the in-flight work when it expires;
// the store transaction rolls back unless it already committed.
//
// ============================================================================

pub struct OrderOrchestrator {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    transitions: TransitionPolicy,
    enrichment: EnrichmentPolicy,
    create_timeout: Option<Duration>,
    metrics: Arc<Metrics>,
}

impl OrderOrchestrator {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            catalog,
            transitions: TransitionPolicy::any_to_any(),
            enrichment: EnrichmentPolicy::Strict,
            create_timeout: None,
            metrics,
        }
    }

    pub fn with_transitions(mut self, transitions: TransitionPolicy) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn with_enrichment(mut self, enrichment: EnrichmentPolicy) -> Self {
        self.enrichment = enrichment;
        self
    }

    pub fn with_create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = Some(timeout);
        self
    }

    #[instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn create_order(&self, items: Vec<OrderItemRequest>) -> Result<EnrichedOrder, OrderError> {
        let attempt = self.try_create_order(&items);
        let outcome = match self.create_timeout {
            Some(limit) => tokio::time::timeout(limit, attempt)
                .await
                .unwrap_or(Err(OrderError::Timeout)),
            None => attempt.await,
        };

        match outcome {
            Ok(order) => {
                self.metrics.record_order_created();
                tracing::info!(
                    order_id = %order.order.id,
                    total_items = order.order.total_items,
                    total_amount = %order.order.total_amount,
                    "Order created"
                );
                Ok(order)
            }
            Err(e) => {
                self.metrics.record_creation_failure(e.kind());
                tracing::error!(reason = e.kind(), error = %e, "Order creation failed");
                Err(OrderError::CreationFailed)
            }
        }
    }

    async fn try_create_order(&self, items: &[OrderItemRequest]) -> Result<EnrichedOrder, OrderError> {
        let product_ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();

        let products = self.catalog.resolve(&product_ids).await?;

        let draft = OrderAggregateBuilder::build(items, &products)?;

        let created = self
            .store
            .create_with_items(draft.total_amount, draft.total_items, &draft.items)
            .await?;

        self.enrich(created).await
    }

    #[instrument(skip(self))]
    pub async fn find_all_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<OrderPage, OrderError> {
        let stored = self.store.find_page(status, page).await?;

        tracing::debug!(
            total = stored.total,
            returned = stored.orders.len(),
            "Listed orders"
        );

        Ok(OrderPage {
            data: stored.orders,
            meta: PageMeta::new(stored.total, page.page, page.limit),
        })
    }

    #[instrument(skip(self))]
    pub async fn find_one_order(&self, id: Uuid) -> Result<EnrichedOrder, OrderError> {
        let order = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?;

        self.enrich(order).await
    }

    /// Move an order to `status`.
    ///
    /// Asking for the current status returns the order untouched without a
    /// write. The write itself only succeeds if the status is still the one
    /// that was read.
    #[instrument(skip(self))]
    pub async fn change_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrderError::NotFound(id))?
            .order;

        if current.status == status {
            tracing::debug!(order_id = %id, status = %status, "Status unchanged");
            return Ok(current);
        }

        if !self.transitions.permits(current.status, status) {
            return Err(OrderError::TransitionNotAllowed {
                from: current.status,
                to: status,
            });
        }

        match self.store.compare_and_set_status(id, current.status, status).await? {
            Some(updated) => {
                self.metrics
                    .record_status_change(current.status.as_str(), status.as_str());
                tracing::info!(
                    order_id = %id,
                    from = %current.status,
                    to = %status,
                    "Order status changed"
                );
                Ok(updated)
            }
            None => match self.store.find_by_id(id).await? {
                Some(_) => {
                    tracing::warn!(order_id = %id, "Order status changed concurrently");
                    Err(OrderError::StatusConflict(id))
                }
                None => Err(OrderError::NotFound(id)),
            },
        }
    }

    async fn enrich(&self, order: OrderWithItems) -> Result<EnrichedOrder, OrderError> {
        match self.catalog.resolve(&order.product_ids()).await {
            Ok(products) => OrderAggregateBuilder::enrich(order, &products),
            Err(e) if self.enrichment == EnrichmentPolicy::Degrade => {
                tracing::warn!(
                    order_id = %order.order.id,
                    error = %e,
                    "Product names unavailable, returning order without names"
                );
                Ok(OrderAggregateBuilder::without_names(order))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
