use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use brewbot_core::catalog::demo_catalog;
use brewbot_core::trace::{StepDraft, StepKind, TraceScope};
use brewbot_core::{CatalogItem, StageOutcome};

use crate::embedder::QueryEmbedder;
use crate::index::{IndexError, QueryRequest, VectorIndex};
use crate::tracer::ExecutionTracer;

/// Similarity retrieval with a never-fail public contract.
///
/// `initialize` is the only operation that surfaces a hard error; once the
/// pipeline is serving, any failure along embed → query → map degrades to the
/// static demo catalog.
pub struct CatalogRetriever {
    embedder: QueryEmbedder,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
    tracer: ExecutionTracer,
}

impl CatalogRetriever {
    pub fn new(
        embedder: QueryEmbedder,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
        tracer: ExecutionTracer,
    ) -> Self {
        Self { embedder, index, top_k, tracer }
    }

    /// Establish the index connection up front. Callers decide whether a
    /// failure here aborts startup or the process runs in degraded mode.
    pub async fn initialize(&self) -> Result<(), IndexError> {
        self.index.ensure_ready().await
    }

    /// Top-K catalog retrieval for a free-text query.
    ///
    /// Results keep the index's ranking order; metadata defaults are applied
    /// here and nowhere else. Returns at least the demo catalog.
    pub async fn top_matches(
        &self,
        query: &str,
        scope: Option<&TraceScope>,
    ) -> StageOutcome<Vec<CatalogItem>> {
        let embedded = self.embedder.embed(query).await;
        let embed_cause = embedded.cause().map(str::to_owned);
        let vector = embedded.into_value();

        let outcome = match self
            .index
            .query(QueryRequest { vector, top_k: self.top_k })
            .await
        {
            Ok(matches) => {
                let items: Vec<CatalogItem> = matches
                    .into_iter()
                    .map(|m| m.metadata.into_item(m.id, Some(m.score)))
                    .collect();
                StageOutcome::Ok(items)
            }
            Err(error) => {
                warn!(
                    event_name = "pipeline.retrieve.fallback",
                    error = %error,
                    "vector query failed; serving demo catalog"
                );
                StageOutcome::degraded(demo_catalog(), format!("index query failed: {error}"))
            }
        }
        .with_upstream_cause(embed_cause);

        self.tracer
            .record(
                scope,
                StepDraft::new(
                    "get_inventory",
                    StepKind::Tool,
                    json!({ "query": query }),
                    serde_json::to_value(outcome.value()).unwrap_or(Value::Null),
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
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use brewbot_core::catalog::ItemMetadata;
    use brewbot_core::trace::{StepRecord, TraceScope};

    use super::CatalogRetriever;
    use crate::embedder::{EmbedError, EmbeddingClient, QueryEmbedder};
    use crate::index::{IndexError, IndexMatch, QueryRequest, VectorIndex};
    use crate::tracer::{ExecutionTracer, TraceError, TraceSink};

    struct FixedEmbedder {
        dimensions: usize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
            if self.fail {
                return Err(EmbedError::EmptyResponse);
            }
            Ok(vec![0.5; self.dimensions])
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }

    struct ScriptedIndex {
        matches: Result<Vec<IndexMatch>, ()>,
        queries: Mutex<Vec<QueryRequest>>,
    }

    impl ScriptedIndex {
        fn returning(matches: Vec<IndexMatch>) -> Self {
            Self { matches: Ok(matches), queries: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { matches: Err(()), queries: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl VectorIndex for ScriptedIndex {
        async fn ensure_ready(&self) -> Result<(), IndexError> {
            if self.matches.is_err() {
                return Err(IndexError::MissingCredentials);
            }
            Ok(())
        }

        async fn query(&self, request: QueryRequest) -> Result<Vec<IndexMatch>, IndexError> {
            self.queries.lock().await.push(request);
            match &self.matches {
                Ok(matches) => Ok(matches.clone()),
                Err(()) => {
                    Err(IndexError::Service { status: 500, body: "index down".to_owned() })
                }
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        records: Mutex<Vec<StepRecord>>,
    }

    #[async_trait]
    impl TraceSink for RecordingSink {
        async fn open(&self, _scope: &TraceScope) -> Result<(), TraceError> {
            Ok(())
        }

        async fn record(&self, record: &StepRecord) -> Result<(), TraceError> {
            self.records.lock().await.push(record.clone());
            Ok(())
        }

        async fn close(&self, _scope: &TraceScope) -> Result<(), TraceError> {
            Ok(())
        }
    }

    fn latte_matches() -> Vec<IndexMatch> {
        vec![
            IndexMatch {
                id: "latte-001".to_owned(),
                score: 0.93,
                metadata: ItemMetadata {
                    name: Some("Creamy Latte".to_owned()),
                    price: Some(Decimal::new(425, 2)),
                    category: Some("Coffee".to_owned()),
                    description: Some("Smooth espresso with steamed milk".to_owned()),
                    available: Some(true),
                    stock: Some(30),
                    searchable_text: None,
                },
            },
            IndexMatch {
                id: "mocha-001".to_owned(),
                score: 0.81,
                metadata: ItemMetadata {
                    name: Some("Mocha".to_owned()),
                    price: Some(Decimal::new(450, 2)),
                    category: Some("Coffee".to_owned()),
                    description: None,
                    available: None,
                    stock: None,
                    searchable_text: None,
                },
            },
            IndexMatch { id: "mystery-001".to_owned(), score: 0.40, metadata: ItemMetadata::default() },
        ]
    }

    fn retriever(embed_fail: bool, index: Arc<ScriptedIndex>) -> CatalogRetriever {
        CatalogRetriever::new(
            QueryEmbedder::new(Arc::new(FixedEmbedder { dimensions: 1536, fail: embed_fail })),
            index,
            3,
            ExecutionTracer::disabled(),
        )
    }

    #[tokio::test]
    async fn matches_keep_index_order_and_apply_metadata_defaults() {
        let index = Arc::new(ScriptedIndex::returning(latte_matches()));
        let subject = retriever(false, index.clone());

        let outcome = subject.top_matches("latte", None).await;

        assert!(!outcome.is_degraded());
        let items = outcome.value();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Creamy Latte");
        assert_eq!(items[0].relevance, Some(0.93));
        assert_eq!(items[1].name, "Mocha");
        assert!(items[1].available, "absent availability defaults to true");
        assert_eq!(items[1].description, "");
        assert_eq!(items[2].name, "Unknown Item");
        assert_eq!(items[2].category, "Beverages");
        assert_eq!(items[2].price, Decimal::ZERO);

        let queries = index.queries.lock().await;
        assert_eq!(queries[0].top_k, 3);
    }

    #[tokio::test]
    async fn failing_index_degrades_to_the_five_item_demo_catalog() {
        let subject = retriever(false, Arc::new(ScriptedIndex::failing()));

        let outcome = subject.top_matches("latte", None).await;

        assert!(outcome.is_degraded());
        let items = outcome.value();
        assert_eq!(items.len(), 5);
        assert!(items.iter().any(|item| !item.available && item.stock == 0));
        assert!(items.iter().all(|item| !item.name.is_empty()));
    }

    #[tokio::test]
    async fn uninitialized_index_never_blocks_retrieval() {
        let index = Arc::new(ScriptedIndex::failing());
        let subject = retriever(false, index.clone());

        assert!(subject.initialize().await.is_err());
        let outcome = subject.top_matches("anything", None).await;
        assert_eq!(outcome.value().len(), 5);
    }

    #[tokio::test]
    async fn embedding_fallback_marks_the_outcome_degraded_but_still_queries() {
        let index = Arc::new(ScriptedIndex::returning(latte_matches()));
        let subject = retriever(true, index.clone());

        let outcome = subject.top_matches("latte", None).await;

        assert!(outcome.is_degraded());
        assert!(outcome.cause().expect("cause").contains("embedding failed"));
        assert_eq!(outcome.value().len(), 3);

        // The synthetic vector still has the model's full dimensionality.
        let queries = index.queries.lock().await;
        assert_eq!(queries[0].vector.dimensions(), 1536);
    }

    #[tokio::test]
    async fn identical_queries_yield_identical_ranking() {
        let subject = retriever(false, Arc::new(ScriptedIndex::returning(latte_matches())));

        let first = subject.top_matches("latte", None).await;
        let second = subject.top_matches("latte", None).await;

        let names = |outcome: &brewbot_core::StageOutcome<Vec<brewbot_core::CatalogItem>>| {
            outcome.value().iter().map(|item| item.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
    }

    #[tokio::test]
    async fn malformed_queries_still_return_well_formed_items() {
        for query in ["", "   ", "\n\t", "🤖🤖🤖"] {
            let subject = retriever(false, Arc::new(ScriptedIndex::failing()));
            let outcome = subject.top_matches(query, None).await;
            assert!(!outcome.value().is_empty(), "query {query:?} should still return items");
            assert!(outcome.value().iter().all(|item| !item.name.is_empty()));
        }
    }

    #[tokio::test]
    async fn retrieval_emits_a_tool_step_record() {
        let sink = Arc::new(RecordingSink::default());
        let tracer = ExecutionTracer::new(sink.clone(), "Coffee Shop Bot");
        let subject = CatalogRetriever::new(
            QueryEmbedder::new(Arc::new(FixedEmbedder { dimensions: 8, fail: false })),
            Arc::new(ScriptedIndex::returning(latte_matches())),
            3,
            tracer.clone(),
        );

        let scope = tracer.open().await;
        subject.top_matches("latte", scope.as_ref()).await;

        let records = sink.records.lock().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].node_name, "get_inventory");
        assert_eq!(records[0].input, serde_json::json!({"query": "latte"}));
    }
}
