use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

use super::{match_requested, CatalogError, ProductCatalog};
use crate::domain::order::{Product, ProductId};
use crate::messaging::rpc::{RpcReply, STATUS_BAD_REQUEST, STATUS_NOT_FOUND};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

// ============================================================================
// NATS Product Catalog Client
// ============================================================================
//
// One request/reply round trip per `resolve`: the JSON array of ids goes out
// on the catalog subject, one enveloped reply comes back. The circuit breaker
// only sees transport failures; a catalog saying "no such product" is a
// healthy answer.
//
// ============================================================================

pub struct NatsProductCatalog {
    client: async_nats::Client,
    subject: String,
    timeout: Duration,
    circuit_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
}

impl NatsProductCatalog {
    pub fn new(
        client: async_nats::Client,
        subject: impl Into<String>,
        timeout: Duration,
        breaker: CircuitBreakerConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            client,
            subject: subject.into(),
            timeout,
            circuit_breaker: CircuitBreaker::new("product-catalog", breaker),
            metrics,
        }
    }

    async fn round_trip(&self, payload: Vec<u8>) -> Result<async_nats::Message, CatalogError> {
        let result = self
            .circuit_breaker
            .call(async {
                let request = self.client.request(self.subject.clone(), payload.into());

                match tokio::time::timeout(self.timeout, request).await {
                    Ok(Ok(message)) => Ok(message),
                    Ok(Err(e)) => Err(CatalogError::Unavailable(e.to_string())),
                    Err(_) => Err(CatalogError::Unavailable(format!(
                        "no reply within {}ms",
                        self.timeout.as_millis()
                    ))),
                }
            })
            .await;

        self.metrics
            .update_circuit_state(self.circuit_breaker.state().await.code());

        match result {
            Ok(message) => Ok(message),
            Err(CircuitBreakerError::Open(name)) => Err(CatalogError::Unavailable(format!(
                "circuit breaker '{}' is open",
                name
            ))),
            Err(CircuitBreakerError::Failed(e)) => Err(e),
        }
    }
}

#[async_trait]
impl ProductCatalog for NatsProductCatalog {
    #[instrument(skip(self, product_ids), fields(subject = %self.subject, count = product_ids.len()))]
    async fn resolve(&self, product_ids: &[ProductId]) -> Result<Vec<Product>, CatalogError> {
        let started = Instant::now();

        let result = match serde_json::to_vec(product_ids) {
            Ok(payload) => match self.round_trip(payload).await {
                Ok(message) => decode_reply(product_ids, &message.payload),
                Err(e) => Err(e),
            },
            Err(e) => Err(CatalogError::InvalidResponse(format!("encode request: {}", e))),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(CatalogError::ProductNotFound(_)) => "not_found",
            Err(CatalogError::Unavailable(_)) => "unavailable",
            Err(CatalogError::InvalidResponse(_)) => "invalid",
        };
        self.metrics
            .record_catalog_request(outcome, started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Product lookup failed");
        }

        result
    }
}

/// Decode one catalog reply into products lined up with `requested`
fn decode_reply(requested: &[ProductId], payload: &[u8]) -> Result<Vec<Product>, CatalogError> {
    let reply: RpcReply<Vec<Product>> = serde_json::from_slice(payload)
        .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

    match reply.into_result() {
        Ok(Some(products)) => match_requested(requested, products),
        Ok(None) => Err(CatalogError::InvalidResponse("reply carried no products".into())),
        Err(fault) if fault.status == STATUS_BAD_REQUEST || fault.status == STATUS_NOT_FOUND => {
            // The catalog rejects the batch as a whole without naming ids
            tracing::debug!(message = %fault.message, "Catalog rejected product batch");
            let mut ids = requested.to_vec();
            ids.sort_unstable();
            ids.dedup();
            Err(CatalogError::ProductNotFound(ids))
        }
        Err(fault) => Err(CatalogError::Unavailable(fault.message)),
    }
}
