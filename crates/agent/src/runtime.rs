use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use brewbot_core::gateway::MessageGateway;
use brewbot_core::trace::{StepDraft, StepKind, TraceScope};
use brewbot_core::{CatalogItem, StageOutcome};

use crate::generator::ResponseGenerator;
use crate::retriever::CatalogRetriever;
use crate::tracer::ExecutionTracer;

/// Everything the orchestrator knows about one inbound message. Passed
/// explicitly per turn; there is no cross-turn session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurnContext {
    pub chat_id: i64,
    pub user_id: i64,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    EmptyMessage,
}

#[derive(Debug, PartialEq)]
pub enum TurnOutcome {
    /// The turn was dropped before any processing.
    Skipped(SkipReason),
    Completed(TurnReport),
}

/// Per-stage outcome of a completed turn, assertable in tests.
#[derive(Debug, PartialEq)]
pub struct TurnReport {
    pub execution_id: Option<String>,
    pub retrieval: StageOutcome<Vec<CatalogItem>>,
    pub generation: StageOutcome<String>,
    pub delivered: bool,
}

#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn top_matches(
        &self,
        query: &str,
        scope: Option<&TraceScope>,
    ) -> StageOutcome<Vec<CatalogItem>>;
}

#[async_trait]
impl InventorySource for CatalogRetriever {
    async fn top_matches(
        &self,
        query: &str,
        scope: Option<&TraceScope>,
    ) -> StageOutcome<Vec<CatalogItem>> {
        CatalogRetriever::top_matches(self, query, scope).await
    }
}

#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(
        &self,
        user_message: &str,
        items: &[CatalogItem],
        scope: Option<&TraceScope>,
    ) -> StageOutcome<String>;
}

#[async_trait]
impl ReplyGenerator for ResponseGenerator {
    async fn generate(
        &self,
        user_message: &str,
        items: &[CatalogItem],
        scope: Option<&TraceScope>,
    ) -> StageOutcome<String> {
        ResponseGenerator::generate(self, user_message, items, scope).await
    }
}

/// The per-turn state machine:
/// open trace → retrieve → generate → deliver → close trace.
///
/// Each stage's failure is contained locally and converted into that stage's
/// fallback, so a turn that starts always reaches the delivery stage. A
/// failed delivery is logged and accepted as terminal; nothing retries.
pub struct TurnOrchestrator {
    inventory: Arc<dyn InventorySource>,
    generator: Arc<dyn ReplyGenerator>,
    gateway: Arc<dyn MessageGateway>,
    tracer: ExecutionTracer,
}

impl TurnOrchestrator {
    pub fn new(
        inventory: Arc<dyn InventorySource>,
        generator: Arc<dyn ReplyGenerator>,
        gateway: Arc<dyn MessageGateway>,
        tracer: ExecutionTracer,
    ) -> Self {
        Self { inventory, generator, gateway, tracer }
    }

    pub async fn handle_turn(&self, turn: &TurnContext) -> TurnOutcome {
        if turn.text.trim().is_empty() {
            debug!(
                event_name = "turn.skipped",
                chat_id = turn.chat_id,
                "skipping empty customer message"
            );
            return TurnOutcome::Skipped(SkipReason::EmptyMessage);
        }

        let scope = self.tracer.open().await;

        if let Err(error) = self.gateway.send_typing(turn.chat_id).await {
            debug!(chat_id = turn.chat_id, error = %error, "typing indicator failed");
        }

        let retrieval = self.inventory.top_matches(&turn.text, scope.as_ref()).await;
        let generation =
            self.generator.generate(&turn.text, retrieval.value(), scope.as_ref()).await;

        let reply = generation.value().clone();
        let delivered = match self.gateway.send_text(turn.chat_id, &reply, None).await {
            Ok(()) => {
                self.tracer
                    .record(
                        scope.as_ref(),
                        StepDraft::new(
                            "send_message",
                            StepKind::Tool,
                            json!({ "text": reply }),
                            json!({ "status": "success" }),
                        ),
                    )
                    .await;
                true
            }
            Err(error) => {
                warn!(
                    event_name = "turn.delivery_failed",
                    chat_id = turn.chat_id,
                    error = %error,
                    "reply delivery failed; dropping message"
                );
                false
            }
        };

        let execution_id = scope.as_ref().map(|scope| scope.execution_id.clone());
        self.tracer.close(scope).await;

        info!(
            event_name = "turn.completed",
            chat_id = turn.chat_id,
            user_id = turn.user_id,
            execution_id = execution_id.as_deref().unwrap_or("untraced"),
            retrieval_degraded = retrieval.is_degraded(),
            generation_degraded = generation.is_degraded(),
            delivered,
            "customer turn completed"
        );

        TurnOutcome::Completed(TurnReport { execution_id, retrieval, generation, delivered })
    }
}
