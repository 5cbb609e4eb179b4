use serde::Deserialize;
use uuid::Uuid;

use super::errors::ValidationError;
use super::value_objects::{OrderItemRequest, OrderStatus};
use crate::store::PageRequest;

// ============================================================================
// Order Commands - Inbound payloads and their boundary validation
// ============================================================================

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderPayload {
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderPayload {
    pub fn validate(self) -> Result<Vec<OrderItemRequest>, ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::EmptyItems);
        }

        for item in &self.items {
            if item.product_id <= 0 {
                return Err(ValidationError::InvalidProductId(item.product_id));
            }
            if item.quantity <= 0 {
                return Err(ValidationError::InvalidQuantity(item.quantity));
            }
        }

        Ok(self.items)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderPaginationPayload {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    i64::from(DEFAULT_PAGE)
}

fn default_limit() -> i64 {
    i64::from(DEFAULT_LIMIT)
}

impl OrderPaginationPayload {
    pub fn validate(self, max_limit: u32) -> Result<(Option<OrderStatus>, PageRequest), ValidationError> {
        let page = positive(self.page, "page")?;
        let limit = positive(self.limit, "limit")?;

        if limit > max_limit {
            return Err(ValidationError::LimitTooLarge { max: max_limit });
        }

        Ok((self.status, PageRequest { page, limit }))
    }
}

fn positive(value: i64, field: &'static str) -> Result<u32, ValidationError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ValidationError::NotPositive { field })
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindOneOrderPayload {
    pub id: String,
}

impl FindOneOrderPayload {
    pub fn validate(self) -> Result<Uuid, ValidationError> {
        parse_id(&self.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeOrderStatusPayload {
    pub id: String,
    pub status: OrderStatus,
}

impl ChangeOrderStatusPayload {
    pub fn validate(self) -> Result<(Uuid, OrderStatus), ValidationError> {
        Ok((parse_id(&self.id)?, self.status))
    }
}

/// Only the canonical 8-4-4-4-12 hyphenated form is accepted
fn parse_id(raw: &str) -> Result<Uuid, ValidationError> {
    let invalid = || ValidationError::InvalidId(raw.to_string());

    if raw.len() != HYPHENATED_UUID_LEN {
        return Err(invalid());
    }
    Uuid::try_parse(raw).map_err(|_| invalid())
}

const HYPHENATED_UUID_LEN: usize = 36;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_requires_items() {
        let payload: CreateOrderPayload = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(payload.validate(), Err(ValidationError::EmptyItems));
    }

    #[test]
    fn test_create_order_rejects_non_positive_quantity() {
        let payload: CreateOrderPayload =
            serde_json::from_str(r#"{"items": [{"productId": 1, "quantity": 0}]}"#).unwrap();
        assert_eq!(payload.validate(), Err(ValidationError::InvalidQuantity(0)));
    }

    #[test]
    fn test_create_order_rejects_non_positive_product_id() {
        let payload: CreateOrderPayload =
            serde_json::from_str(r#"{"items": [{"productId": -4, "quantity": 1}]}"#).unwrap();
        assert_eq!(payload.validate(), Err(ValidationError::InvalidProductId(-4)));
    }

    #[test]
    fn test_create_order_keeps_duplicates() {
        let payload: CreateOrderPayload = serde_json::from_str(
            r#"{"items": [{"productId": 1, "quantity": 1}, {"productId": 1, "quantity": 2}]}"#,
        )
        .unwrap();
        assert_eq!(payload.validate().unwrap().len(), 2);
    }

    #[test]
    fn test_pagination_defaults() {
        let payload: OrderPaginationPayload = serde_json::from_str("{}").unwrap();
        let (status, page) = payload.validate(100).unwrap();

        assert_eq!(status, None);
        assert_eq!(page, PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn test_pagination_rejects_zero_and_oversized() {
        let zero: OrderPaginationPayload = serde_json::from_str(r#"{"page": 0}"#).unwrap();
        assert_eq!(
            zero.validate(100),
            Err(ValidationError::NotPositive { field: "page" })
        );

        let big: OrderPaginationPayload = serde_json::from_str(r#"{"limit": 500}"#).unwrap();
        assert_eq!(big.validate(100), Err(ValidationError::LimitTooLarge { max: 100 }));
    }

    #[test]
    fn test_pagination_status_filter() {
        let payload: OrderPaginationPayload =
            serde_json::from_str(r#"{"status": "DELIVERED", "page": 2, "limit": 5}"#).unwrap();
        let (status, page) = payload.validate(100).unwrap();

        assert_eq!(status, Some(OrderStatus::Delivered));
        assert_eq!(page, PageRequest { page: 2, limit: 5 });
    }

    #[test]
    fn test_find_one_requires_uuid() {
        let payload = FindOneOrderPayload {
            id: "not-a-uuid".to_string(),
        };
        assert_eq!(
            payload.validate(),
            Err(ValidationError::InvalidId("not-a-uuid".to_string()))
        );
    }

    #[test]
    fn test_ids_must_be_hyphenated() {
        let canonical = "0192f0c4-8b9e-7cc1-a3c6-1f4f3b2d9e10";
        assert!(parse_id(canonical).is_ok());
        assert!(parse_id(&canonical.to_uppercase()).is_ok());

        for raw in [
            "0192f0c48b9e7cc1a3c61f4f3b2d9e10",
            "{0192f0c4-8b9e-7cc1-a3c6-1f4f3b2d9e10}",
            "urn:uuid:0192f0c4-8b9e-7cc1-a3c6-1f4f3b2d9e10",
        ] {
            assert_eq!(
                parse_id(raw),
                Err(ValidationError::InvalidId(raw.to_string())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_change_status_rejects_unknown_status() {
        let result = serde_json::from_str::<ChangeOrderStatusPayload>(
            r#"{"id": "0192f0c4-8b9e-7cc1-a3c6-1f4f3b2d9e10", "status": "LOST"}"#,
        );
        assert!(result.is_err());
    }
}
