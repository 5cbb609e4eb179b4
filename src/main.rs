use actix::prelude::*;
use anyhow::Context as _;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod catalog;
mod config;
mod domain;
mod messaging;
mod metrics;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use actors::OrderActor;
use catalog::NatsProductCatalog;
use domain::order::OrderOrchestrator;
use messaging::{CommandListener, ListenerSettings};
use store::PostgresOrderStore;

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, override with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,orders_service=debug")),
        )
        .init();

    tracing::info!("Starting orders service");

    let settings = config::AppConfig::load().context("loading configuration")?;

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        families = metrics.registry().gather().len(),
        "Metrics registry created"
    );

    if settings.metrics.enabled {
        let registry = Arc::new(metrics.registry().clone());
        let port = settings.metrics.port;
        actix::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(registry, port).await {
                tracing::error!(error = %e, "Metrics server error");
            }
        });
    }

    // === 2. PostgreSQL ===
    tracing::info!("Connecting to PostgreSQL");
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout_secs))
        .connect(&settings.database.url)
        .await
        .context("connecting to PostgreSQL")?;

    let store = PostgresOrderStore::new(pool);
    store.ensure_schema().await.context("creating order tables")?;

    // === 3. NATS ===
    tracing::info!(url = %settings.nats.url, "Connecting to NATS");
    let nats = async_nats::ConnectOptions::new()
        .request_timeout(Some(settings.catalog.timeout()))
        .connect(&settings.nats.url)
        .await
        .context("connecting to NATS")?;

    // === 4. Catalog client and orchestrator ===
    let catalog = NatsProductCatalog::new(
        nats.clone(),
        settings.catalog.subject.clone(),
        settings.catalog.timeout(),
        (&settings.catalog.circuit_breaker).into(),
        metrics.clone(),
    );

    let orchestrator = OrderOrchestrator::new(Arc::new(store), Arc::new(catalog), metrics.clone())
        .with_transitions(settings.orders.transition_policy())
        .with_enrichment(settings.orders.enrichment)
        .with_create_timeout(settings.orders.request_timeout());

    // === 5. Order actor and command listener ===
    let order_actor = OrderActor::new(Arc::new(orchestrator)).start();

    let listener = CommandListener::new(
        nats,
        order_actor,
        metrics,
        ListenerSettings {
            request_timeout: settings.orders.request_timeout(),
            max_page_limit: settings.orders.page_limit_cap(),
        },
    );

    tracing::info!("Orders service ready");

    listener
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("Orders service stopped");
    Ok(())
}
