use rust_decimal::Decimal;
use std::collections::HashMap;

use super::errors::{OrderError, ValidationError};
use super::value_objects::*;
use crate::catalog::CatalogError;

// ============================================================================
// Order Aggregate Builder - Pure pricing and enrichment
// ============================================================================
//
// No I/O here. Creation turns requested lines plus resolved products into
// totals and priced lines; reads join stored lines with current product
// names. Prices always come from the stored snapshot, never from the
// catalog, once an order exists.
//
// ============================================================================

pub struct OrderAggregateBuilder;

impl OrderAggregateBuilder {
    /// Price every requested line and compute the order totals.
    ///
    /// Each line contributes `price * quantity` on its own; totals are plain
    /// sums over the lines.
    pub fn build(
        requested: &[OrderItemRequest],
        products: &[Product],
    ) -> Result<OrderDraft, OrderError> {
        let catalog = index(products);

        let mut total_amount = Decimal::ZERO;
        let mut total_items: i32 = 0;
        let mut items = Vec::with_capacity(requested.len());

        for line in requested {
            let product = catalog.get(&line.product_id).ok_or_else(|| {
                OrderError::Catalog(CatalogError::ProductNotFound(vec![line.product_id]))
            })?;

            let line_total = product
                .price
                .checked_mul(Decimal::from(line.quantity))
                .ok_or(ValidationError::TotalsOverflow)?;

            total_amount = total_amount
                .checked_add(line_total)
                .ok_or(ValidationError::TotalsOverflow)?;
            total_items = total_items
                .checked_add(line.quantity)
                .ok_or(ValidationError::TotalsOverflow)?;

            items.push(PricedItem {
                product_id: line.product_id,
                quantity: line.quantity,
                price: product.price,
            });
        }

        Ok(OrderDraft {
            total_amount,
            total_items,
            items,
        })
    }

    /// Annotate stored lines with the current product names
    pub fn enrich(order: OrderWithItems, products: &[Product]) -> Result<EnrichedOrder, OrderError> {
        let catalog = index(products);

        let items = order
            .items
            .into_iter()
            .map(|item| {
                let product = catalog.get(&item.product_id).ok_or_else(|| {
                    OrderError::Catalog(CatalogError::ProductNotFound(vec![item.product_id]))
                })?;

                Ok(EnrichedOrderItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                    name: Some(product.name.clone()),
                })
            })
            .collect::<Result<Vec<_>, OrderError>>()?;

        Ok(EnrichedOrder {
            order: order.order,
            items,
        })
    }

    /// Stored lines without names, used when the catalog cannot be reached
    pub fn without_names(order: OrderWithItems) -> EnrichedOrder {
        let items = order
            .items
            .into_iter()
            .map(|item| EnrichedOrderItem {
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
                name: None,
            })
            .collect();

        EnrichedOrder {
            order: order.order,
            items,
        }
    }
}

fn index(products: &[Product]) -> HashMap<ProductId, &Product> {
    let mut by_id = HashMap::with_capacity(products.len());
    for product in products {
        by_id.entry(product.id).or_insert(product);
    }
    by_id
}

// ============================================================================
// Unit Tests
// ============================================================================
