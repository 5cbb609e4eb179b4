// ============================================================================
// Messaging Module
// ============================================================================
//
// - rpc  - reply envelope and fault classification shared by both directions
// - nats - inbound command listener and dispatch
//
// ============================================================================

pub mod nats;
pub mod rpc;

pub use nats::{CommandListener, ListenerSettings};
