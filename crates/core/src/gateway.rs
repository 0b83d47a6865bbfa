use async_trait::async_trait;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("message send failed: {0}")]
    Send(String),
    #[error("chat action failed: {0}")]
    ChatAction(String),
}

/// Outbound chat-transport capability.
///
/// The pipeline only needs "send text to a conversation"; the transport crate
/// provides the real implementation and tests substitute scripted fakes.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), GatewayError>;

    async fn send_typing(&self, chat_id: i64) -> Result<(), GatewayError>;
}
