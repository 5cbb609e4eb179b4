// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Order pricing, status rules and the orchestration of the catalog and the
// store. Transport and storage details live outside this layer.
//
// ============================================================================

pub mod order;
