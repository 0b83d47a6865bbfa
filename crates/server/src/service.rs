//! Adapters binding the Telegram event dispatcher to the sales pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use brewbot_agent::retriever::CatalogRetriever;
use brewbot_agent::runtime::{TurnContext, TurnOrchestrator};
use brewbot_core::CatalogItem;
use brewbot_telegram::events::{
    CommandHandler, CustomerMessageHandler, CustomerTurnService, EventContext, EventDispatcher,
    EventHandlerError, MenuService, MessageEvent, OutgoingMessage,
};

/// Runs the full pipeline for one customer turn. The orchestrator delivers
/// its own reply, so the dispatcher has nothing left to send.
pub struct PipelineTurnService {
    orchestrator: Arc<TurnOrchestrator>,
}

impl PipelineTurnService {
    pub fn new(orchestrator: Arc<TurnOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl CustomerTurnService for PipelineTurnService {
    async fn handle_customer_message(
        &self,
        event: &MessageEvent,
        _ctx: &EventContext,
    ) -> Result<Option<OutgoingMessage>, EventHandlerError> {
        let turn = TurnContext {
            chat_id: event.chat_id,
            user_id: event.user_id,
            text: event.text.clone(),
        };
        self.orchestrator.handle_turn(&turn).await;
        Ok(None)
    }
}

/// Serves /menu from the same retrieval path customers hit, with a blank
/// browse query.
pub struct RetrieverMenuService {
    retriever: Arc<CatalogRetriever>,
}

impl RetrieverMenuService {
    pub fn new(retriever: Arc<CatalogRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl MenuService for RetrieverMenuService {
    async fn menu_items(&self) -> Result<Vec<CatalogItem>, EventHandlerError> {
        Ok(self.retriever.top_matches("", None).await.into_value())
    }
}

pub fn pipeline_dispatcher(
    orchestrator: Arc<TurnOrchestrator>,
    retriever: Arc<CatalogRetriever>,
) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(CommandHandler::new(RetrieverMenuService::new(retriever)));
    dispatcher.register(CustomerMessageHandler::new(PipelineTurnService::new(orchestrator)));
    dispatcher
}
