use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use brewbot_agent::embedder::{OpenAiEmbedder, QueryEmbedder};
use brewbot_agent::generator::{OpenAiChat, ResponseGenerator};
use brewbot_agent::index::PineconeIndex;
use brewbot_agent::prompt::{PromptError, PromptTemplate};
use brewbot_agent::retriever::CatalogRetriever;
use brewbot_agent::runtime::TurnOrchestrator;
use brewbot_agent::tracer::ExecutionTracer;
use brewbot_core::config::{AppConfig, ConfigError, LoadOptions};
use brewbot_telegram::api::TelegramApi;

pub struct Application {
    pub config: AppConfig,
    pub api: Arc<TelegramApi>,
    pub index: Arc<PineconeIndex>,
    pub retriever: Arc<CatalogRetriever>,
    pub orchestrator: Arc<TurnOrchestrator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    // Long polls block server-side; give the transport client headroom
    // beyond the poll window itself.
    let telegram_client = http_client(config.telegram.poll_timeout_secs + 10)?;
    let openai_client = http_client(config.openai.timeout_secs)?;
    let pinecone_client = http_client(config.pinecone.timeout_secs)?;
    let trace_client = http_client(10)?;

    let api = Arc::new(TelegramApi::new(telegram_client, &config.telegram.bot_token));
    let tracer = ExecutionTracer::from_config(trace_client, &config.observability);

    let embedder =
        QueryEmbedder::new(Arc::new(OpenAiEmbedder::new(openai_client.clone(), &config.openai)));
    let index = Arc::new(PineconeIndex::new(pinecone_client, &config.pinecone));
    let retriever = Arc::new(CatalogRetriever::new(
        embedder,
        index.clone(),
        config.pinecone.top_k,
        tracer.clone(),
    ));

    let template = PromptTemplate::from_config(&config.prompt)?;
    let generator = Arc::new(ResponseGenerator::new(
        Arc::new(OpenAiChat::new(openai_client, &config.openai)),
        template,
        tracer.clone(),
        config.openai.max_tokens,
        config.openai.temperature,
    ));

    let orchestrator = Arc::new(TurnOrchestrator::new(
        retriever.clone(),
        generator,
        api.clone(),
        tracer,
    ));

    // Index initialization is best-effort: a failure here leaves the bot
    // serving the demo catalog instead of aborting startup.
    match retriever.initialize().await {
        Ok(()) => info!(
            event_name = "system.bootstrap.index_ready",
            correlation_id = "bootstrap",
            index_name = %index.index_name(),
            "vector index connection established"
        ),
        Err(error) => warn!(
            event_name = "system.bootstrap.index_degraded",
            correlation_id = "bootstrap",
            index_name = %index.index_name(),
            error = %error,
            "vector index unavailable; continuing with demo catalog"
        ),
    }

    info!(
        event_name = "system.bootstrap.complete",
        correlation_id = "bootstrap",
        tracing_enabled = config.observability.enabled,
        "application bootstrap complete"
    );

    Ok(Application { config, api, index, retriever, orchestrator })
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, BootstrapError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(BootstrapError::HttpClient)
}
