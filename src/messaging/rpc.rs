use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::domain::order::OrderError;

// ============================================================================
// Request/Reply Envelope
// ============================================================================
//
// Every reply on the bus, ours or the catalog's, is one of:
//   { "response": <value> }
//   { "err": { "status": <u16>, "message": <string> } }
//
// ============================================================================

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL: u16 = 500;
pub const STATUS_UNAVAILABLE: u16 = 503;
pub const STATUS_TIMEOUT: u16 = 504;

/// Fault returned to callers: a status classification and a short message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{status}: {message}")]
pub struct RpcError {
    pub status: u16,
    pub message: String,
}

impl RpcError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(STATUS_INTERNAL, "Internal server error")
    }
}

impl From<&OrderError> for RpcError {
    fn from(err: &OrderError) -> Self {
        match err {
            OrderError::Validation(e) => RpcError::new(STATUS_BAD_REQUEST, e.to_string()),
            OrderError::NotFound(_) => RpcError::new(STATUS_NOT_FOUND, err.to_string()),
            OrderError::CreationFailed => RpcError::new(STATUS_BAD_REQUEST, err.to_string()),
            OrderError::Catalog(CatalogError::ProductNotFound(_)) => {
                RpcError::new(STATUS_BAD_REQUEST, err.to_string())
            }
            OrderError::Catalog(_) => RpcError::new(STATUS_UNAVAILABLE, err.to_string()),
            OrderError::TransitionNotAllowed { .. } => {
                RpcError::new(STATUS_BAD_REQUEST, err.to_string())
            }
            OrderError::StatusConflict(_) => RpcError::new(STATUS_CONFLICT, err.to_string()),
            OrderError::Timeout => RpcError::new(STATUS_TIMEOUT, err.to_string()),
            OrderError::Store(_) => RpcError::internal(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReply<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<RpcError>,
}

impl<T> RpcReply<T> {
    pub fn ok(response: T) -> Self {
        Self {
            response: Some(response),
            err: None,
        }
    }

    pub fn fault(err: RpcError) -> Self {
        Self {
            response: None,
            err: Some(err),
        }
    }

    pub fn into_result(self) -> Result<Option<T>, RpcError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.response),
        }
    }
}

impl<T> From<Result<T, RpcError>> for RpcReply<T> {
    fn from(result: Result<T, RpcError>) -> Self {
        match result {
            Ok(value) => RpcReply::ok(value),
            Err(err) => RpcReply::fault(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::ValidationError;
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        let id = Uuid::now_v7();

        assert_eq!(RpcError::from(&OrderError::NotFound(id)).status, 404);
        assert_eq!(RpcError::from(&OrderError::CreationFailed).status, 400);
        assert_eq!(
            RpcError::from(&OrderError::Validation(ValidationError::EmptyItems)).status,
            400
        );
        assert_eq!(
            RpcError::from(&OrderError::Catalog(CatalogError::Unavailable("down".into()))).status,
            503
        );
        assert_eq!(RpcError::from(&OrderError::StatusConflict(id)).status, 409);
        assert_eq!(RpcError::from(&OrderError::Timeout).status, 504);
    }

    #[test]
    fn test_not_found_message_names_the_order() {
        let id = Uuid::now_v7();
        let err = RpcError::from(&OrderError::NotFound(id));
        assert_eq!(err.message, format!("Order with id {} not found", id));
    }

    #[test]
    fn test_store_details_are_hidden() {
        let err = OrderError::Store(StoreError::CorruptRow("status = 'BOGUS'".into()));
        let rpc = RpcError::from(&err);

        assert_eq!(rpc.status, 500);
        assert!(!rpc.message.contains("BOGUS"));
    }

    #[test]
    fn test_reply_envelope_shapes() {
        let ok = serde_json::to_value(RpcReply::ok(vec![1, 2])).unwrap();
        assert_eq!(ok, serde_json::json!({ "response": [1, 2] }));

        let fault: RpcReply<()> = RpcReply::fault(RpcError::new(404, "gone"));
        let value = serde_json::to_value(fault).unwrap();
        assert_eq!(value, serde_json::json!({ "err": { "status": 404, "message": "gone" } }));
    }

    #[test]
    fn test_reply_envelope_decodes_faults() {
        let reply: RpcReply<Vec<i64>> =
            serde_json::from_str(r#"{"err": {"status": 400, "message": "bad ids"}}"#).unwrap();

        assert_eq!(reply.into_result(), Err(RpcError::new(400, "bad ids")));
    }
}
