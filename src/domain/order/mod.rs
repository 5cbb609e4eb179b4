// ============================================================================
// Order Domain
// ============================================================================
//
// Everything order specific:
// - Value objects (Order, OrderItem, OrderStatus, Product, pagination)
// - Commands (inbound payloads + boundary validation)
// - Errors (OrderError, ValidationError)
// - Policies (allowed status transitions, enrichment fallback)
// - Aggregate builder (pricing, totals, name enrichment)
// - Orchestrator (catalog → builder → store sequencing)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod policy;
pub mod aggregate;
pub mod orchestrator;

pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use policy::*;
pub use orchestrator::*;
