mod bootstrap;
mod health;
mod service;

use std::sync::Arc;

use anyhow::Result;
use brewbot_core::config::{AppConfig, LoadOptions};
use brewbot_telegram::poller::{LongPollRunner, LongPollTransport, ReconnectPolicy};

fn init_logging(config: &AppConfig) {
    use brewbot_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.index.clone(),
    )
    .await?;

    let dispatcher = service::pipeline_dispatcher(app.orchestrator.clone(), app.retriever.clone());
    let transport = Arc::new(LongPollTransport::new(
        app.api.clone(),
        app.config.telegram.poll_timeout_secs,
    ));
    let runner = LongPollRunner::new(
        transport,
        dispatcher,
        app.api.clone(),
        ReconnectPolicy::default(),
    );

    let runner_handle = tokio::spawn(async move {
        if let Err(error) = runner.start().await {
            tracing::error!(
                event_name = "system.server.runner_failed",
                correlation_id = "runtime",
                error = %error,
                "telegram runner terminated unexpectedly"
            );
        }
    });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "brewbot-server started"
    );

    wait_for_shutdown().await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "brewbot-server stopping"
    );
    runner_handle.abort();

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
