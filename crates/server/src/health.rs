use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use brewbot_agent::index::VectorIndex;

#[derive(Clone)]
pub struct HealthState {
    index: Arc<dyn VectorIndex>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub vector_index: HealthCheck,
    pub checked_at: String,
}

pub fn router(index: Arc<dyn VectorIndex>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { index })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    index: Arc<dyn VectorIndex>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(index)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

/// An unreachable index is reported as degraded, not down: the bot keeps
/// serving customers from the demo catalog, so the endpoint stays 200.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let vector_index = index_check(state.index.as_ref()).await;
    let ready = vector_index.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "brewbot-server runtime initialized".to_string(),
        },
        vector_index,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

async fn index_check(index: &dyn VectorIndex) -> HealthCheck {
    match index.ensure_ready().await {
        Ok(()) => {
            HealthCheck { status: "ready", detail: "vector index reachable".to_string() }
        }
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("vector index unavailable: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};

    use brewbot_agent::index::{IndexError, IndexMatch, QueryRequest, VectorIndex};

    use super::{health, HealthState};

    struct ScriptedIndex {
        ready: bool,
    }

    #[async_trait]
    impl VectorIndex for ScriptedIndex {
        async fn ensure_ready(&self) -> Result<(), IndexError> {
            if self.ready {
                Ok(())
            } else {
                Err(IndexError::MissingCredentials)
            }
        }

        async fn query(&self, _request: QueryRequest) -> Result<Vec<IndexMatch>, IndexError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn health_reports_ready_when_the_index_is_reachable() {
        let state = HealthState { index: Arc::new(ScriptedIndex { ready: true }) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.vector_index.status, "ready");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_reports_degraded_but_serving_when_the_index_is_down() {
        let state = HealthState { index: Arc::new(ScriptedIndex { ready: false }) };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.vector_index.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
