use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use brewbot_core::config::OpenAiConfig;
use brewbot_core::StageOutcome;

/// Query substituted for blank input so an empty message still retrieves a
/// meaningful top-K set instead of erroring.
pub const DEFAULT_BROWSE_QUERY: &str = "coffee drinks menu";

/// Fixed-length embedding vector. Produced only by the embedder, consumed
/// only by the retriever, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryVector(Vec<f32>);

impl QueryVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn into_values(self) -> Vec<f32> {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("embedding provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("embedding response contained no vectors")]
    EmptyResponse,
}

#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Output dimensionality of the model; the fallback vector must match it.
    fn dimensions(&self) -> usize;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            dimensions: config.embedding_dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest { model: &self.model, input: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Provider { status, body });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or(EmbedError::EmptyResponse)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Turns customer text into a query vector, degrading to a synthetic vector
/// of the correct dimensionality when the embedding call fails. The fallback
/// IS the retry strategy: a degraded near-uniform ranking beats a broken turn.
#[derive(Clone)]
pub struct QueryEmbedder {
    client: Arc<dyn EmbeddingClient>,
}

impl QueryEmbedder {
    pub fn new(client: Arc<dyn EmbeddingClient>) -> Self {
        Self { client }
    }

    /// Blank input maps to [`DEFAULT_BROWSE_QUERY`]; everything else is
    /// lowercased for case-insensitive matching intent.
    pub fn normalize_query(text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            DEFAULT_BROWSE_QUERY.to_owned()
        } else {
            trimmed.to_lowercase()
        }
    }

    pub async fn embed(&self, text: &str) -> StageOutcome<QueryVector> {
        let query = Self::normalize_query(text);
        match self.client.embed(&query).await {
            Ok(values) => StageOutcome::Ok(QueryVector::new(values)),
            Err(error) => {
                warn!(
                    event_name = "pipeline.embed.fallback",
                    error = %error,
                    "embedding call failed; using synthetic query vector"
                );
                StageOutcome::degraded(self.fallback_vector(), format!("embedding failed: {error}"))
            }
        }
    }

    fn fallback_vector(&self) -> QueryVector {
        let mut rng = rand::thread_rng();
        let values =
            (0..self.client.dimensions()).map(|_| rng.gen::<f32>() * 0.1 - 0.05).collect();
        QueryVector::new(values)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::{EmbedError, EmbeddingClient, QueryEmbedder, DEFAULT_BROWSE_QUERY};

    struct FixedEmbedder {
        dimensions: usize,
        fail: bool,
        last_input: tokio::sync::Mutex<Option<String>>,
    }

    impl FixedEmbedder {
        fn new(dimensions: usize, fail: bool) -> Self {
            Self { dimensions, fail, last_input: tokio::sync::Mutex::new(None) }
        }
    }

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            *self.last_input.lock().await = Some(text.to_owned());
            if self.fail {
                return Err(EmbedError::EmptyResponse);
            }
            Ok(vec![0.25; self.dimensions])
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    #[test]
    fn blank_queries_normalize_to_the_default_browse_query() {
        assert_eq!(QueryEmbedder::normalize_query(""), DEFAULT_BROWSE_QUERY);
        assert_eq!(QueryEmbedder::normalize_query("   "), DEFAULT_BROWSE_QUERY);
    }

    #[test]
    fn queries_are_lowercased_before_embedding() {
        assert_eq!(QueryEmbedder::normalize_query("  Strong LATTE "), "strong latte");
    }

    #[tokio::test]
    async fn successful_embedding_returns_the_model_vector() {
        let client = Arc::new(FixedEmbedder::new(8, false));
        let embedder = QueryEmbedder::new(client.clone());

        let outcome = embedder.embed("Latte").await;

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.value().dimensions(), 8);
        assert_eq!(client.last_input.lock().await.as_deref(), Some("latte"));
    }

    #[tokio::test]
    async fn fallback_vector_matches_model_dimensionality_exactly() {
        let embedder = QueryEmbedder::new(Arc::new(FixedEmbedder::new(1536, true)));

        let outcome = embedder.embed("latte").await;

        assert!(outcome.is_degraded());
        assert_eq!(outcome.value().dimensions(), 1536);
        assert!(outcome.value().values().iter().all(|value| value.abs() <= 0.05));
    }
}
