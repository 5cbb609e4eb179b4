// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the orders service
// ============================================================================
//
// Covers:
// - Inbound commands by name
// - Order creation outcomes (failures labelled with the hidden cause)
// - Catalog round trips (outcome and latency)
// - Status transitions
// - Catalog circuit breaker state
//
// Scraped via /metrics on the metrics server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub commands_received: IntCounterVec,

    pub orders_created: IntCounter,
    pub order_creation_failures: IntCounterVec,

    pub catalog_requests: IntCounterVec,
    pub catalog_request_duration: HistogramVec,

    pub status_changes: IntCounterVec,

    pub catalog_circuit_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_received = IntCounterVec::new(
            Opts::new("order_commands_received_total", "Inbound order commands"),
            &["command"],
        )?;
        registry.register(Box::new(commands_received.clone()))?;

        let orders_created = IntCounter::new("orders_created_total", "Orders persisted")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_creation_failures = IntCounterVec::new(
            Opts::new(
                "order_creation_failures_total",
                "Failed order creations by underlying cause",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(order_creation_failures.clone()))?;

        let catalog_requests = IntCounterVec::new(
            Opts::new("catalog_requests_total", "Product catalog lookups by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(catalog_requests.clone()))?;

        let catalog_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "catalog_request_duration_seconds",
                "Product catalog round trip latency",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(catalog_request_duration.clone()))?;

        let status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Persisted order status changes"),
            &["from", "to"],
        )?;
        registry.register(Box::new(status_changes.clone()))?;

        let catalog_circuit_state = IntGauge::new(
            "catalog_circuit_breaker_state",
            "Catalog circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(catalog_circuit_state.clone()))?;

        Ok(Self {
            registry,
            commands_received,
            orders_created,
            order_creation_failures,
            catalog_requests,
            catalog_request_duration,
            status_changes,
            catalog_circuit_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_command(&self, command: &str) {
        self.commands_received.with_label_values(&[command]).inc();
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_creation_failure(&self, reason: &str) {
        self.order_creation_failures.with_label_values(&[reason]).inc();
    }

    pub fn record_catalog_request(&self, outcome: &str, duration_secs: f64) {
        self.catalog_requests.with_label_values(&[outcome]).inc();
        self.catalog_request_duration
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    pub fn record_status_change(&self, from: &str, to: &str) {
        self.status_changes.with_label_values(&[from, to]).inc();
    }

    pub fn update_circuit_state(&self, code: i64) {
        self.catalog_circuit_state.set(code);
    }
}
