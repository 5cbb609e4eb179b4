// ============================================================================
// Actors Module
// ============================================================================
//
// The order actor is the single in-process entry point for order commands.
// Transports turn validated payloads into its messages and await replies.
//
// ============================================================================

mod order_actor;

pub use order_actor::{ChangeOrderStatus, CreateOrder, FindAllOrders, FindOneOrder, OrderActor};
