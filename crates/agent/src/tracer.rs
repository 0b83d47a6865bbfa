use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use brewbot_core::config::ObservabilityConfig;
use brewbot_core::trace::{StepDraft, StepRecord, TraceScope};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("trace collector returned status {status}: {body}")]
    Collector { status: u16, body: String },
}

/// Backend operations for one turn's observability context. Pure telemetry:
/// nothing here is ever read back by the pipeline.
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn open(&self, scope: &TraceScope) -> Result<(), TraceError>;
    async fn record(&self, record: &StepRecord) -> Result<(), TraceError>;
    async fn close(&self, scope: &TraceScope) -> Result<(), TraceError>;
}

pub struct NoopTraceSink;

#[async_trait]
impl TraceSink for NoopTraceSink {
    async fn open(&self, _scope: &TraceScope) -> Result<(), TraceError> {
        Ok(())
    }

    async fn record(&self, _record: &StepRecord) -> Result<(), TraceError> {
        Ok(())
    }

    async fn close(&self, _scope: &TraceScope) -> Result<(), TraceError> {
        Ok(())
    }
}

/// HTTP trace collector client.
pub struct HttpTraceSink {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpTraceSink {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: SecretString) -> Self {
        Self { client, endpoint: endpoint.trim_end_matches('/').to_owned(), api_key }
    }

    async fn post<T: serde::Serialize>(&self, path: &str, payload: &T) -> Result<(), TraceError> {
        let url = format!("{}{path}", self.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TraceError::Collector { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl TraceSink for HttpTraceSink {
    async fn open(&self, scope: &TraceScope) -> Result<(), TraceError> {
        self.post("/executions/start", scope).await
    }

    async fn record(&self, record: &StepRecord) -> Result<(), TraceError> {
        self.post("/executions/steps", record).await
    }

    async fn close(&self, scope: &TraceScope) -> Result<(), TraceError> {
        self.post("/executions/end", scope).await
    }
}

/// Fire-and-forget tracing facade shared by the pipeline stages.
///
/// Failures never propagate: a failed open yields an untraced turn (`None`
/// scope, every later call a no-op), failed records and closes are logged and
/// dropped. Cloning is cheap; the sink is shared.
#[derive(Clone)]
pub struct ExecutionTracer {
    inner: Option<Arc<TracerInner>>,
}

struct TracerInner {
    sink: Arc<dyn TraceSink>,
    agent_name: String,
}

impl ExecutionTracer {
    pub fn new(sink: Arc<dyn TraceSink>, agent_name: impl Into<String>) -> Self {
        Self { inner: Some(Arc::new(TracerInner { sink, agent_name: agent_name.into() })) }
    }

    pub fn from_config(client: reqwest::Client, config: &ObservabilityConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        match (&config.endpoint, &config.api_key) {
            (Some(endpoint), Some(api_key)) => Self::new(
                Arc::new(HttpTraceSink::new(client, endpoint, api_key.clone())),
                config.agent_name.clone(),
            ),
            _ => Self::disabled(),
        }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn open(&self) -> Option<TraceScope> {
        let inner = self.inner.as_ref()?;
        let scope = TraceScope {
            execution_id: Uuid::new_v4().to_string(),
            agent_name: inner.agent_name.clone(),
        };

        match inner.sink.open(&scope).await {
            Ok(()) => Some(scope),
            Err(error) => {
                warn!(
                    event_name = "trace.open_failed",
                    agent_name = %scope.agent_name,
                    error = %error,
                    "trace open failed; continuing turn without tracing"
                );
                None
            }
        }
    }

    pub async fn record(&self, scope: Option<&TraceScope>, draft: StepDraft) {
        let (Some(inner), Some(scope)) = (self.inner.as_ref(), scope) else {
            return;
        };

        let record = draft.bind(scope);
        if let Err(error) = inner.sink.record(&record).await {
            warn!(
                event_name = "trace.record_failed",
                node_name = %record.node_name,
                execution_id = %record.execution_id,
                error = %error,
                "step record failed; continuing"
            );
        }
    }

    pub async fn close(&self, scope: Option<TraceScope>) {
        let (Some(inner), Some(scope)) = (self.inner.as_ref(), scope) else {
            return;
        };

        if let Err(error) = inner.sink.close(&scope).await {
            warn!(
                event_name = "trace.close_failed",
                execution_id = %scope.execution_id,
                error = %error,
                "trace close failed; turn already delivered"
            );
        }
    }
}
