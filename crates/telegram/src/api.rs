use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use brewbot_core::gateway::{GatewayError, MessageGateway, ParseMode};

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram returned status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("telegram rejected the call: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BotProfile {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

/// Telegram Bot API client. The token is part of every request URL, so the
/// resolved base URL is kept private and never logged.
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(client: reqwest::Client, bot_token: &SecretString) -> Self {
        Self::with_api_root(client, "https://api.telegram.org", bot_token)
    }

    pub fn with_api_root(
        client: reqwest::Client,
        api_root: &str,
        bot_token: &SecretString,
    ) -> Self {
        let base_url =
            format!("{}/bot{}", api_root.trim_end_matches('/'), bot_token.expose_secret());
        Self { client, base_url }
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{method}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TelegramError::Http { status, body });
        }

        let parsed: ApiResponse<T> = response.json().await?;
        if !parsed.ok {
            return Err(TelegramError::Api(
                parsed.description.unwrap_or_else(|| "no description".to_owned()),
            ));
        }

        parsed.result.ok_or_else(|| TelegramError::Api("response carried no result".to_owned()))
    }

    pub async fn get_me(&self) -> Result<BotProfile, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    /// Long poll for updates after `offset`. Blocks server-side up to
    /// `timeout_secs`, so an empty reply just means a quiet interval.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesBody { offset, timeout: timeout_secs, allowed_updates: &["message"] },
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message, TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode.as_str());
        }
        self.call("sendMessage", &body).await
    }

    pub async fn send_chat_action(
        &self,
        chat_id: i64,
        action: &str,
    ) -> Result<bool, TelegramError> {
        self.call("sendChatAction", &json!({ "chat_id": chat_id, "action": action })).await
    }
}

#[async_trait]
impl MessageGateway for TelegramApi {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), GatewayError> {
        self.send_message(chat_id, text, parse_mode)
            .await
            .map(|_| ())
            .map_err(|error| GatewayError::Send(error.to_string()))
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), GatewayError> {
        self.send_chat_action(chat_id, "typing")
            .await
            .map(|_| ())
            .map_err(|error| GatewayError::ChatAction(error.to_string()))
    }
}
