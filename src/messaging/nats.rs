use actix::prelude::*;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::rpc::{RpcError, RpcReply, STATUS_BAD_REQUEST};
use crate::actors::{ChangeOrderStatus, CreateOrder, FindAllOrders, FindOneOrder, OrderActor};
use crate::domain::order::{
    ChangeOrderStatusPayload, CreateOrderPayload, FindOneOrderPayload, OrderError,
    OrderPaginationPayload, ValidationError,
};

// ============================================================================
// NATS Command Listener
// ============================================================================
//
// Subscribes to one subject per order command. Every inbound message is
// decoded, validated, forwarded to the order actor and answered on its reply
// subject with the { response } / { err } envelope. Each message runs in its
// own task, bounded by the request timeout.
//
// ============================================================================

pub const CREATE_ORDER: &str = "create_order";
pub const FIND_ALL_ORDERS: &str = "findAllOrders";
pub const FIND_ONE_ORDER: &str = "findOneOrder";
pub const CHANGE_ORDER_STATUS: &str = "changeOrderStatus";

pub const COMMAND_SUBJECTS: [&str; 4] = [
    CREATE_ORDER,
    FIND_ALL_ORDERS,
    FIND_ONE_ORDER,
    CHANGE_ORDER_STATUS,
];

#[derive(Debug, Clone, Copy)]
pub struct ListenerSettings {
    pub request_timeout: Duration,
    pub max_page_limit: u32,
}

pub struct CommandListener {
    client: async_nats::Client,
    actor: Addr<OrderActor>,
    metrics: Arc<crate::metrics::Metrics>,
    settings: ListenerSettings,
}

impl CommandListener {
    pub fn new(
        client: async_nats::Client,
        actor: Addr<OrderActor>,
        metrics: Arc<crate::metrics::Metrics>,
        settings: ListenerSettings,
    ) -> Self {
        Self {
            client,
            actor,
            metrics,
            settings,
        }
    }

    /// Serve commands until `shutdown` resolves or every subscription ends
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let mut subscriptions = Vec::with_capacity(COMMAND_SUBJECTS.len());
        for subject in COMMAND_SUBJECTS {
            subscriptions.push(self.client.subscribe(subject).await?);
            tracing::info!(subject, "Subscribed to order command");
        }

        let mut messages = futures_util::stream::select_all(subscriptions);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, command listener stopping");
                    break;
                }
                next = messages.next() => match next {
                    Some(message) => self.spawn_reply(message),
                    None => {
                        tracing::warn!("All command subscriptions closed");
                        break;
                    }
                },
            }
        }

        self.client.flush().await?;
        Ok(())
    }

    fn spawn_reply(&self, message: async_nats::Message) {
        let client = self.client.clone();
        let actor = self.actor.clone();
        let metrics = self.metrics.clone();
        let settings = self.settings;

        actix::spawn(async move {
            let Some(reply_to) = message.reply.clone() else {
                tracing::warn!(subject = %message.subject, "Dropping command without reply subject");
                return;
            };

            let command = message.subject.to_string();
            metrics.record_command(&command);
            let started = Instant::now();

            let result = answer(&actor, &command, &message.payload, settings).await;

            if let Err(fault) = &result {
                tracing::debug!(command = %command, status = fault.status, message = %fault.message, "Command faulted");
            }

            let body = match serde_json::to_vec(&RpcReply::from(result)) {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(command = %command, error = %e, "Failed to encode reply");
                    return;
                }
            };

            if let Err(e) = client.publish(reply_to, body.into()).await {
                tracing::error!(command = %command, error = %e, "Failed to publish reply");
            }

            tracing::debug!(
                command = %command,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Command answered"
            );
        });
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run one command under the request deadline.
///
/// A late `create_order` reports the same generic creation fault as any
/// other creation failure. The orchestrator's own deadline drops the
/// abandoned work and counts the failure.
pub async fn answer(
    actor: &Addr<OrderActor>,
    command: &str,
    payload: &[u8],
    settings: ListenerSettings,
) -> Result<serde_json::Value, RpcError> {
    let work = dispatch(actor, command, payload, settings.max_page_limit);

    match tokio::time::timeout(settings.request_timeout, work).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                command = %command,
                timeout_ms = settings.request_timeout.as_millis() as u64,
                "Command timed out"
            );
            if command == CREATE_ORDER {
                Err(RpcError::from(&OrderError::CreationFailed))
            } else {
                Err(RpcError::from(&OrderError::Timeout))
            }
        }
    }
}

/// Decode and validate one command payload, run it through the actor and
/// encode the success value
pub async fn dispatch(
    actor: &Addr<OrderActor>,
    command: &str,
    payload: &[u8],
    max_page_limit: u32,
) -> Result<serde_json::Value, RpcError> {
    match command {
        CREATE_ORDER => {
            let items = decode::<CreateOrderPayload>(payload)?
                .validate()
                .map_err(bad_request)?;
            reply(actor.send(CreateOrder { items }).await)
        }
        FIND_ALL_ORDERS => {
            let (status, page) = decode::<OrderPaginationPayload>(payload)?
                .validate(max_page_limit)
                .map_err(bad_request)?;
            reply(actor.send(FindAllOrders { status, page }).await)
        }
        FIND_ONE_ORDER => {
            let id = decode::<FindOneOrderPayload>(payload)?
                .validate()
                .map_err(bad_request)?;
            reply(actor.send(FindOneOrder { id }).await)
        }
        CHANGE_ORDER_STATUS => {
            let (id, status) = decode::<ChangeOrderStatusPayload>(payload)?
                .validate()
                .map_err(bad_request)?;
            reply(actor.send(ChangeOrderStatus { id, status }).await)
        }
        other => Err(RpcError::new(
            STATUS_BAD_REQUEST,
            format!("Unknown command '{}'", other),
        )),
    }
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, RpcError> {
    serde_json::from_slice(payload)
        .map_err(|e| bad_request(ValidationError::MalformedPayload(e.to_string())))
}

fn bad_request(err: ValidationError) -> RpcError {
    RpcError::from(&OrderError::Validation(err))
}

fn reply<T: Serialize>(
    outcome: Result<Result<T, OrderError>, MailboxError>,
) -> Result<serde_json::Value, RpcError> {
    match outcome {
        Ok(Ok(value)) => serde_json::to_value(value).map_err(|e| {
            tracing::error!(error = %e, "Failed to encode response");
            RpcError::internal()
        }),
        Ok(Err(e)) => Err(RpcError::from(&e)),
        Err(e) => {
            tracing::error!(error = %e, "Order actor unreachable");
            Err(RpcError::internal())
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
