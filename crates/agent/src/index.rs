use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use brewbot_core::catalog::ItemMetadata;
use brewbot_core::config::PineconeConfig;

use crate::embedder::QueryVector;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector index credentials are not configured")]
    MissingCredentials,
    #[error("index request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("index returned status {status}: {body}")]
    Service { status: u16, body: String },
    #[error("index `{0}` did not resolve to a query host")]
    UnresolvedHost(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryRequest {
    pub vector: QueryVector,
    pub top_k: usize,
}

/// One raw similarity match; metadata stays partial until the retriever
/// applies defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexMatch {
    pub id: String,
    pub score: f32,
    pub metadata: ItemMetadata,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Establish the index connection. The one operation allowed to surface a
    /// hard error to callers.
    async fn ensure_ready(&self) -> Result<(), IndexError>;

    /// Top-K similarity query, metadata only. Results keep the index's
    /// descending-relevance ordering.
    async fn query(&self, request: QueryRequest) -> Result<Vec<IndexMatch>, IndexError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<MatchPayload>,
}

#[derive(Debug, Deserialize)]
struct MatchPayload {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<ItemMetadata>,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    host: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct UpsertRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ItemMetadata,
}

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    vectors: &'a [UpsertRecord],
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

/// Pinecone-backed vector index.
///
/// The query host is resolved lazily from the controller on first use and
/// cached for the process lifetime. A missing API key turns every call into
/// `MissingCredentials`, which the retriever absorbs as degraded mode.
pub struct PineconeIndex {
    client: reqwest::Client,
    controller_url: String,
    index_name: String,
    api_key: Option<SecretString>,
    host: RwLock<Option<String>>,
}

impl PineconeIndex {
    pub fn new(client: reqwest::Client, config: &PineconeConfig) -> Self {
        Self {
            client,
            controller_url: config.controller_url.trim_end_matches('/').to_owned(),
            index_name: config.index_name.clone(),
            api_key: config.api_key.clone(),
            host: RwLock::new(None),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    fn api_key(&self) -> Result<&str, IndexError> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
            .ok_or(IndexError::MissingCredentials)
    }

    async fn resolve_host(&self) -> Result<String, IndexError> {
        if let Some(host) = self.host.read().await.clone() {
            return Ok(host);
        }

        let api_key = self.api_key()?;
        let url = format!("{}/indexes/{}", self.controller_url, self.index_name);
        let response = self.client.get(&url).header("Api-Key", api_key).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Service { status, body });
        }

        let described: DescribeResponse = response.json().await?;
        if described.host.trim().is_empty() {
            return Err(IndexError::UnresolvedHost(self.index_name.clone()));
        }

        let host = if described.host.starts_with("http://") || described.host.starts_with("https://")
        {
            described.host
        } else {
            format!("https://{}", described.host)
        };

        *self.host.write().await = Some(host.clone());
        info!(
            event_name = "index.host_resolved",
            index_name = %self.index_name,
            "vector index host resolved"
        );

        Ok(host)
    }

    /// Batched vector write used by the ingestion tool.
    pub async fn upsert(&self, records: &[UpsertRecord]) -> Result<usize, IndexError> {
        let host = self.resolve_host().await?;
        let url = format!("{host}/vectors/upsert");
        let response = self
            .client
            .post(&url)
            .header("Api-Key", self.api_key()?)
            .json(&UpsertBody { vectors: records })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Service { status, body });
        }

        let parsed: UpsertResponse = response.json().await?;
        Ok(parsed.upserted_count)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn ensure_ready(&self) -> Result<(), IndexError> {
        self.resolve_host().await.map(|_| ())
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<IndexMatch>, IndexError> {
        let host = self.resolve_host().await?;
        let url = format!("{host}/query");
        let body = QueryBody {
            vector: request.vector.values(),
            top_k: request.top_k,
            include_metadata: true,
            include_values: false,
        };

        let response =
            self.client.post(&url).header("Api-Key", self.api_key()?).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Service { status, body });
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed
            .matches
            .into_iter()
            .map(|payload| IndexMatch {
                id: payload.id,
                score: payload.score,
                metadata: payload.metadata.unwrap_or_default(),
            })
            .collect())
    }
}
