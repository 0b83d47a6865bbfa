use std::{collections::VecDeque, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use brewbot_core::gateway::MessageGateway;

use crate::api::TelegramApi;
use crate::events::{
    classify_update, EventContext, EventDispatcher, HandlerResult, UpdateEnvelope,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<UpdateEnvelope>, TransportError>;
    async fn acknowledge(&self, update_id: i64) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Long-poll transport over the Bot API.
///
/// Acknowledgement advances the update offset so the next `getUpdates` call
/// marks everything up to it as consumed server-side.
pub struct LongPollTransport {
    api: Arc<TelegramApi>,
    poll_timeout_secs: u64,
    state: Mutex<PollState>,
}

#[derive(Default)]
struct PollState {
    buffer: VecDeque<UpdateEnvelope>,
    offset: Option<i64>,
}

impl LongPollTransport {
    pub fn new(api: Arc<TelegramApi>, poll_timeout_secs: u64) -> Self {
        Self { api, poll_timeout_secs, state: Mutex::new(PollState::default()) }
    }
}

#[async_trait]
impl UpdateTransport for LongPollTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let profile = self
            .api
            .get_me()
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        info!(
            event_name = "ingress.telegram.connected",
            bot_username = profile.username.as_deref().unwrap_or("unknown"),
            "telegram bot identity confirmed"
        );
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<UpdateEnvelope>, TransportError> {
        loop {
            let mut state = self.state.lock().await;
            if let Some(envelope) = state.buffer.pop_front() {
                return Ok(Some(envelope));
            }
            let offset = state.offset.map(|acked| acked + 1);
            drop(state);

            let updates = self
                .api
                .get_updates(offset, self.poll_timeout_secs)
                .await
                .map_err(|error| TransportError::Receive(error.to_string()))?;

            if updates.is_empty() {
                // Quiet long-poll interval; poll again.
                continue;
            }

            let mut state = self.state.lock().await;
            state.buffer.extend(updates.into_iter().map(classify_update));
        }
    }

    async fn acknowledge(&self, update_id: i64) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        state.offset = Some(state.offset.map_or(update_id, |acked| acked.max(update_id)));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Drives the update stream: connect, pump envelopes through the dispatcher,
/// deliver handler replies, and reconnect with exponential backoff. Exhausted
/// retries degrade the process instead of crashing it.
pub struct LongPollRunner {
    transport: Arc<dyn UpdateTransport>,
    dispatcher: EventDispatcher,
    gateway: Arc<dyn MessageGateway>,
    reconnect_policy: ReconnectPolicy,
}

impl LongPollRunner {
    pub fn new(
        transport: Arc<dyn UpdateTransport>,
        dispatcher: EventDispatcher,
        gateway: Arc<dyn MessageGateway>,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, gateway, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "telegram transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "telegram retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening telegram update stream");
        self.transport.connect().await?;
        info!(attempt, "telegram update stream connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "telegram update stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            debug!(
                event_name = "ingress.telegram.update_received",
                update_id = envelope.update_id,
                event_type = ?envelope.event.event_type(),
                "received telegram update"
            );

            if let Err(error) = self.transport.acknowledge(envelope.update_id).await {
                warn!(
                    update_id = envelope.update_id,
                    error = %error,
                    "failed to acknowledge telegram update"
                );
            }

            let context = EventContext { correlation_id: format!("update-{}", envelope.update_id) };
            match self.dispatcher.dispatch(&envelope, &context).await {
                Ok(HandlerResult::Replied(message)) => {
                    if let Err(error) = self
                        .gateway
                        .send_text(message.chat_id, &message.text, message.parse_mode)
                        .await
                    {
                        warn!(
                            update_id = envelope.update_id,
                            chat_id = message.chat_id,
                            error = %error,
                            "failed to deliver handler reply"
                        );
                    }
                }
                Ok(HandlerResult::Processed | HandlerResult::Ignored) => {}
                Err(error) => {
                    warn!(
                        update_id = envelope.update_id,
                        error = %error,
                        "event dispatch failed; continuing update loop"
                    );
                }
            }
        }
    }
}
