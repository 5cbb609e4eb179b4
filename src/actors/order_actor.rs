use actix::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::order::{
    EnrichedOrder, Order, OrderError, OrderItemRequest, OrderOrchestrator, OrderPage, OrderStatus,
};
use crate::store::PageRequest;

// ============================================================================
// Actor Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Result<EnrichedOrder, OrderError>")]
pub struct CreateOrder {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Message)]
#[rtype(result = "Result<OrderPage, OrderError>")]
pub struct FindAllOrders {
    pub status: Option<OrderStatus>,
    pub page: PageRequest,
}

#[derive(Message)]
#[rtype(result = "Result<EnrichedOrder, OrderError>")]
pub struct FindOneOrder {
    pub id: Uuid,
}

#[derive(Message)]
#[rtype(result = "Result<Order, OrderError>")]
pub struct ChangeOrderStatus {
    pub id: Uuid,
    pub status: OrderStatus,
}

// ============================================================================
// Order Actor - In-process command boundary in front of the orchestrator
// ============================================================================
//
// Handlers never block the mailbox: each one clones the orchestrator handle
// and returns a future, so commands run concurrently.
//
// ============================================================================

pub struct OrderActor {
    orchestrator: Arc<OrderOrchestrator>,
}

impl OrderActor {
    pub fn new(orchestrator: Arc<OrderOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

impl Actor for OrderActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("OrderActor started");
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<CreateOrder> for OrderActor {
    type Result = ResponseFuture<Result<EnrichedOrder, OrderError>>;

    fn handle(&mut self, msg: CreateOrder, _: &mut Self::Context) -> Self::Result {
        let orchestrator = self.orchestrator.clone();

        Box::pin(async move { orchestrator.create_order(msg.items).await })
    }
}

impl Handler<FindAllOrders> for OrderActor {
    type Result = ResponseFuture<Result<OrderPage, OrderError>>;

    fn handle(&mut self, msg: FindAllOrders, _: &mut Self::Context) -> Self::Result {
        let orchestrator = self.orchestrator.clone();

        Box::pin(async move { orchestrator.find_all_orders(msg.status, msg.page).await })
    }
}

impl Handler<FindOneOrder> for OrderActor {
    type Result = ResponseFuture<Result<EnrichedOrder, OrderError>>;

    fn handle(&mut self, msg: FindOneOrder, _: &mut Self::Context) -> Self::Result {
        let orchestrator = self.orchestrator.clone();

        Box::pin(async move { orchestrator.find_one_order(msg.id).await })
    }
}

impl Handler<ChangeOrderStatus> for OrderActor {
    type Result = ResponseFuture<Result<Order, OrderError>>;

    fn handle(&mut self, msg: ChangeOrderStatus, _: &mut Self::Context) -> Self::Result {
        let orchestrator = self.orchestrator.clone();

        Box::pin(async move { orchestrator.change_order_status(msg.id, msg.status).await })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
