use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use brewbot_core::config::OpenAiConfig;
use brewbot_core::trace::{StepDraft, StepKind, TraceScope};
use brewbot_core::{CatalogItem, StageOutcome};

use crate::prompt::{grounding_text, PromptTemplate};
use crate::tracer::ExecutionTracer;

/// Reply delivered when the generation model is unreachable. Still sells.
pub const FALLBACK_REPLY: &str = "🔥 AMAZING! Whatever you're looking for, we have the BEST coffee in town! Our signature blend will change your life! Only $5.99 for a limited time - but for you, I can make it $4.99! What can I get started for you today? ☕✨";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_owned(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_owned(), content: content.into() }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("completion response contained no choices")]
    EmptyCompletion,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl OpenAiChat {
    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&CompletionRequest { model: &self.model, messages, max_tokens, temperature })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider { status, body });
        }

        let parsed: CompletionResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ChatError::EmptyCompletion)
    }
}

/// Grounded reply generation with a fixed promotional fallback.
///
/// Output is deliberately non-deterministic (temperature 0.9 by default);
/// callers must not assume repeatable text from the happy path.
pub struct ResponseGenerator {
    client: Arc<dyn ChatClient>,
    template: PromptTemplate,
    tracer: ExecutionTracer,
    max_tokens: u32,
    temperature: f32,
}

impl ResponseGenerator {
    pub fn new(
        client: Arc<dyn ChatClient>,
        template: PromptTemplate,
        tracer: ExecutionTracer,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self { client, template, tracer, max_tokens, temperature }
    }

    pub async fn generate(
        &self,
        user_message: &str,
        items: &[CatalogItem],
        scope: Option<&TraceScope>,
    ) -> StageOutcome<String> {
        let grounding = grounding_text(items);
        let messages = vec![
            ChatMessage::system(self.template.render(&grounding)),
            ChatMessage::user(user_message),
        ];

        let outcome =
            match self.client.complete(&messages, self.max_tokens, self.temperature).await {
                Ok(text) => StageOutcome::Ok(text),
                Err(error) => {
                    warn!(
                        event_name = "pipeline.generate.fallback",
                        template_version = %self.template.version(),
                        error = %error,
                        "completion call failed; serving fixed promotional reply"
                    );
                    StageOutcome::degraded(
                        FALLBACK_REPLY.to_owned(),
                        format!("generation failed: {error}"),
                    )
                }
            };

        self.tracer
            .record(
                scope,
                StepDraft::new(
                    "generate_response",
                    StepKind::Model,
                    serde_json::to_value(&messages).unwrap_or(Value::Null),
                    Value::String(outcome.value().clone()),
                ),
            )
            .await;

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use brewbot_core::catalog::demo_catalog;
    use brewbot_core::trace::{StepKind, StepRecord, TraceScope};

    use super::{
        ChatClient, ChatError, ChatMessage, ResponseGenerator, FALLBACK_REPLY,
    };
    use crate::prompt::PromptTemplate;
    use crate::tracer::{ExecutionTracer, TraceError, TraceSink};

    struct ScriptedChat {
        reply: Result<String, ()>,
        captured: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedChat {
        fn replying(text: &str) -> Self {
            Self { reply: Ok(text.to_owned()), captured: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { reply: Err(()), captured: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, ChatError> {
            self.captured.lock().await.push(messages.to_vec());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(ChatError::Provider { status: 504, body: "timeout".to_owned() }),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<StepRecord>>,
        fail_record: bool,
    }

    #[async_trait]
    impl TraceSink for RecordingSink {
        async fn open(&self, _scope: &TraceScope) -> Result<(), TraceError> {
            Ok(())
        }

        async fn record(&self, record: &StepRecord) -> Result<(), TraceError> {
            if self.fail_record {
                return Err(TraceError::Collector { status: 500, body: "boom".to_owned() });
            }
            self.records.lock().await.push(record.clone());
            Ok(())
        }

        async fn close(&self, _scope: &TraceScope) -> Result<(), TraceError> {
            Ok(())
        }
    }

    fn generator(client: Arc<dyn ChatClient>, tracer: ExecutionTracer) -> ResponseGenerator {
        ResponseGenerator::new(
            client,
            PromptTemplate::builtin("sales-v1").expect("builtin"),
            tracer,
            500,
            0.9,
        )
    }

    #[tokio::test]
    async fn system_prompt_carries_the_grounding_for_retrieved_items() {
        let chat = Arc::new(ScriptedChat::replying("Our Creamy Latte is perfect for you!"));
        let subject = generator(chat.clone(), ExecutionTracer::disabled());

        let outcome = subject.generate("latte", &demo_catalog(), None).await;

        assert!(!outcome.is_degraded());
        let captured = chat.captured.lock().await;
        let system = &captured[0][0];
        assert_eq!(system.role, "system");
        assert!(system.content.contains("- Creamy Latte: $4.25 (Coffee)"));
        assert_eq!(captured[0][1].role, "user");
        assert_eq!(captured[0][1].content, "latte");
    }

    #[tokio::test]
    async fn failed_completion_returns_the_literal_fallback_reply() {
        let subject =
            generator(Arc::new(ScriptedChat::failing()), ExecutionTracer::disabled());

        let outcome = subject.generate("latte", &demo_catalog(), None).await;

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value(), FALLBACK_REPLY);
        assert!(outcome.cause().expect("cause").contains("generation failed"));
    }

    #[tokio::test]
    async fn model_step_record_is_emitted_with_messages_and_output() {
        let sink = Arc::new(RecordingSink::default());
        let tracer = ExecutionTracer::new(sink.clone(), "Coffee Shop Bot");
        let subject = generator(Arc::new(ScriptedChat::replying("Enjoy!")), tracer.clone());

        let scope = tracer.open().await;
        subject.generate("latte", &demo_catalog(), scope.as_ref()).await;

        let records = sink.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].node_name, "generate_response");
        assert_eq!(records[0].node_type, StepKind::Model);
        assert_eq!(records[0].output, serde_json::json!("Enjoy!"));
        assert!(records[0].input.to_string().contains("sales agent"));
    }

    #[tokio::test]
    async fn step_record_is_attempted_even_on_the_fallback_path() {
        let sink = Arc::new(RecordingSink { fail_record: true, ..RecordingSink::default() });
        let tracer = ExecutionTracer::new(sink, "Coffee Shop Bot");
        let subject = generator(Arc::new(ScriptedChat::failing()), tracer.clone());

        let scope = tracer.open().await;
        let outcome = subject.generate("latte", &[], scope.as_ref()).await;

        // Record failure is swallowed; the fallback still comes back intact.
        assert_eq!(outcome.value(), FALLBACK_REPLY);
    }
}
