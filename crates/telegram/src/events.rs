use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use brewbot_core::catalog::demo_catalog;
use brewbot_core::gateway::ParseMode;
use brewbot_core::CatalogItem;

use crate::api::Update;
use crate::commands::{self, BotCommand};

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEnvelope {
    pub update_id: i64,
    pub event: TelegramEvent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TelegramEvent {
    Command(CommandEvent),
    CustomerMessage(MessageEvent),
    Unsupported { kind: String },
}

impl TelegramEvent {
    pub fn event_type(&self) -> TelegramEventType {
        match self {
            Self::Command(_) => TelegramEventType::Command,
            Self::CustomerMessage(_) => TelegramEventType::CustomerMessage,
            Self::Unsupported { .. } => TelegramEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TelegramEventType {
    Command,
    CustomerMessage,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CommandEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub command: BotCommand,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub text: String,
}

/// Classify one raw update. Unknown commands and non-text payloads stay
/// unsupported instead of leaking into the sales pipeline.
pub fn classify_update(update: Update) -> UpdateEnvelope {
    let update_id = update.update_id;

    let Some(message) = update.message else {
        return UpdateEnvelope {
            update_id,
            event: TelegramEvent::Unsupported { kind: "non-message-update".to_owned() },
        };
    };

    let chat_id = message.chat.id;
    let (user_id, first_name) = message
        .from
        .map(|user| (user.id, user.first_name))
        .unwrap_or((0, None));

    let Some(text) = message.text.filter(|text| !text.is_empty()) else {
        return UpdateEnvelope {
            update_id,
            event: TelegramEvent::Unsupported { kind: "non-text-message".to_owned() },
        };
    };

    if commands::is_command(&text) {
        return match commands::parse_command(&text) {
            Some(command) => UpdateEnvelope {
                update_id,
                event: TelegramEvent::Command(CommandEvent {
                    chat_id,
                    user_id,
                    first_name,
                    command,
                }),
            },
            None => UpdateEnvelope {
                update_id,
                event: TelegramEvent::Unsupported { kind: format!("command:{text}") },
            },
        };
    }

    UpdateEnvelope {
        update_id,
        event: TelegramEvent::CustomerMessage(MessageEvent { chat_id, user_id, first_name, text }),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

impl OutgoingMessage {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), parse_mode: None }
    }

    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), parse_mode: Some(ParseMode::Markdown) }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HandlerResult {
    Replied(OutgoingMessage),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("command handler failure: {0}")]
    Command(String),
    #[error("customer message handler failure: {0}")]
    CustomerMessage(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> TelegramEventType;
    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<TelegramEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(CommandHandler::new(DemoMenuService));
    dispatcher.register(CustomerMessageHandler::new(EchoCustomerTurnService));
    dispatcher
}

/// Supplies the catalog shown by /menu.
#[async_trait]
pub trait MenuService: Send + Sync {
    async fn menu_items(&self) -> Result<Vec<CatalogItem>, EventHandlerError>;
}

/// Menu source used before the live retriever is wired in.
pub struct DemoMenuService;

#[async_trait]
impl MenuService for DemoMenuService {
    async fn menu_items(&self) -> Result<Vec<CatalogItem>, EventHandlerError> {
        Ok(demo_catalog())
    }
}

pub struct CommandHandler<S> {
    menu: S,
}

impl<S> CommandHandler<S>
where
    S: MenuService,
{
    pub fn new(menu: S) -> Self {
        Self { menu }
    }
}

#[async_trait]
impl<S> EventHandler for CommandHandler<S>
where
    S: MenuService + 'static,
{
    fn event_type(&self) -> TelegramEventType {
        TelegramEventType::Command
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let TelegramEvent::Command(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let message = match event.command {
            BotCommand::Start => OutgoingMessage::plain(
                event.chat_id,
                commands::welcome_message(event.first_name.as_deref()),
            ),
            BotCommand::Menu => {
                let items = self.menu.menu_items().await?;
                OutgoingMessage::markdown(event.chat_id, commands::render_menu(&items))
            }
            BotCommand::Help => {
                OutgoingMessage::markdown(event.chat_id, commands::help_message())
            }
        };

        Ok(HandlerResult::Replied(message))
    }
}

/// Handles one free-text customer turn. The production implementation runs
/// the full sales pipeline and delivers its own reply, returning `None`.
#[async_trait]
pub trait CustomerTurnService: Send + Sync {
    async fn handle_customer_message(
        &self,
        event: &MessageEvent,
        ctx: &EventContext,
    ) -> Result<Option<OutgoingMessage>, EventHandlerError>;
}

/// Stand-in turn service: answers every message with the generic sales line.
pub struct EchoCustomerTurnService;

#[async_trait]
impl CustomerTurnService for EchoCustomerTurnService {
    async fn handle_customer_message(
        &self,
        event: &MessageEvent,
        _ctx: &EventContext,
    ) -> Result<Option<OutgoingMessage>, EventHandlerError> {
        Ok(Some(OutgoingMessage::plain(
            event.chat_id,
            "I can help you with that! We have coffee drinks and fresh pastries. \
             What specifically are you looking for? ☕",
        )))
    }
}

pub struct CustomerMessageHandler<S> {
    service: S,
}

impl<S> CustomerMessageHandler<S>
where
    S: CustomerTurnService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> EventHandler for CustomerMessageHandler<S>
where
    S: CustomerTurnService + 'static,
{
    fn event_type(&self) -> TelegramEventType {
        TelegramEventType::CustomerMessage
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let TelegramEvent::CustomerMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let message = self.service.handle_customer_message(event, ctx).await?;
        Ok(match message {
            Some(message) => HandlerResult::Replied(message),
            None => HandlerResult::Processed,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::api::{Chat, Message, Update, User};
    use crate::commands::BotCommand;

    use super::{
        classify_update, default_dispatcher, EventContext, EventDispatcher, HandlerResult,
        TelegramEvent, UpdateEnvelope,
    };

    fn update(update_id: i64, text: Option<&str>) -> Update {
        Update {
            update_id,
            message: Some(Message {
                message_id: 1,
                from: Some(User { id: 7, first_name: Some("Ada".to_owned()) }),
                chat: Chat { id: 99 },
                text: text.map(str::to_owned),
            }),
        }
    }

    #[test]
    fn free_text_classifies_as_a_customer_message() {
        let envelope = classify_update(update(10, Some("I want a latte")));
        let TelegramEvent::CustomerMessage(event) = envelope.event else {
            panic!("expected customer message");
        };
        assert_eq!(event.chat_id, 99);
        assert_eq!(event.user_id, 7);
        assert_eq!(event.text, "I want a latte");
    }

    #[test]
    fn known_commands_classify_as_commands() {
        let envelope = classify_update(update(11, Some("/menu")));
        let TelegramEvent::Command(event) = envelope.event else {
            panic!("expected command");
        };
        assert_eq!(event.command, BotCommand::Menu);
        assert_eq!(event.first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn unknown_commands_and_non_text_updates_stay_unsupported() {
        let unknown = classify_update(update(12, Some("/order latte")));
        assert!(matches!(unknown.event, TelegramEvent::Unsupported { ref kind } if kind.starts_with("command:")));

        let non_text = classify_update(update(13, None));
        assert!(matches!(non_text.event, TelegramEvent::Unsupported { ref kind } if kind == "non-text-message"));

        let bare = classify_update(Update { update_id: 14, message: None });
        assert!(matches!(bare.event, TelegramEvent::Unsupported { ref kind } if kind == "non-message-update"));
    }

    #[tokio::test]
    async fn dispatcher_routes_start_command_to_a_welcome_reply() {
        let dispatcher = default_dispatcher();
        let envelope = classify_update(update(20, Some("/start")));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        let HandlerResult::Replied(message) = result else {
            panic!("expected reply");
        };
        assert_eq!(message.chat_id, 99);
        assert!(message.text.contains("Welcome to our Coffee Shop, Ada!"));
    }

    #[tokio::test]
    async fn dispatcher_routes_menu_command_to_the_rendered_catalog() {
        let dispatcher = default_dispatcher();
        let envelope = classify_update(update(21, Some("/menu")));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        let HandlerResult::Replied(message) = result else {
            panic!("expected reply");
        };
        assert!(message.text.contains("OUR MENU"));
        assert!(message.text.contains("Creamy Latte"));
        assert!(message.parse_mode.is_some());
    }

    #[tokio::test]
    async fn dispatcher_ignores_unsupported_events_without_handlers() {
        let dispatcher = EventDispatcher::new();
        let envelope = UpdateEnvelope {
            update_id: 30,
            event: TelegramEvent::Unsupported { kind: "sticker".to_owned() },
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn default_dispatcher_registers_command_and_message_handlers() {
        assert_eq!(default_dispatcher().handler_count(), 2);
    }

    #[tokio::test]
    async fn customer_messages_get_a_reply_from_the_stand_in_service() {
        let dispatcher = default_dispatcher();
        let envelope = classify_update(update(22, Some("something sweet")));

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");

        assert!(matches!(result, HandlerResult::Replied(_)));
    }
}
