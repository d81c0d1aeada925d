//! Vector similarity engine backed by Qdrant's REST API.
//!
//! The query is embedded with the configured [`EmbeddingProvider`] and sent to
//! `POST /collections/{collection}/points/search`. Points carry their text in
//! the `page_content` payload field and metadata under `metadata`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EngineKind, Metadata, MetadataValue, SearchHit, VectorEngineConfig};
use crate::domain::ports::{DocumentIndexer, EmbeddingProvider, RetrievalEngine};

pub struct QdrantVectorEngine {
    config: VectorEngineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    client: reqwest::Client,
}

impl QdrantVectorEngine {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(
        config: VectorEngineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        timeout: Duration,
    ) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::ExecutionFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            config,
            embedder,
            client,
        })
    }

    fn unavailable(reason: impl Into<String>) -> DomainError {
        DomainError::unavailable(EngineKind::Vector, reason)
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/collections/{}",
            self.config.url.trim_end_matches('/'),
            self.config.collection
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self
            .config
            .api_key
            .clone()
            .or_else(|| std::env::var("QDRANT_API_KEY").ok())
        {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> DomainResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("Qdrant request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::unavailable(format!("Qdrant returned {status}: {body}")));
        }
        Ok(response)
    }

    /// Create the collection with cosine distance if it does not exist yet.
    pub async fn ensure_collection(&self) -> DomainResult<()> {
        let url = self.collection_url();
        let existing = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("Qdrant request failed: {e}")))?;
        if existing.status().is_success() {
            return Ok(());
        }

        let body = serde_json::json!({
            "vectors": { "size": self.embedder.dimension(), "distance": "Cosine" }
        });
        self.send(self.request(reqwest::Method::PUT, &url).json(&body))
            .await?;
        tracing::info!(collection = %self.config.collection, "created Qdrant collection");
        Ok(())
    }
}

#[async_trait]
impl RetrievalEngine for QdrantVectorEngine {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    async fn search(&self, query: &str, limit: usize) -> DomainResult<Vec<SearchHit>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Self::unavailable(format!("query embedding failed: {e}")))?;

        let url = format!("{}/points/search", self.collection_url());
        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };

        let response: SearchResponse = self
            .send(self.request(reqwest::Method::POST, &url).json(&body))
            .await?
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("unexpected Qdrant response: {e}")))?;

        let hits: Vec<SearchHit> = response
            .result
            .into_iter()
            .filter_map(ScoredPoint::into_hit)
            .collect();
        debug!(hits = hits.len(), "qdrant search completed");
        Ok(hits)
    }
}

#[async_trait]
impl DocumentIndexer for QdrantVectorEngine {
    async fn index_documents(&self, documents: &[SearchHit]) -> DomainResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        self.ensure_collection().await?;

        let mut points = Vec::with_capacity(documents.len());
        for doc in documents {
            let vector = self.embedder.embed(&doc.content).await?;
            points.push(serde_json::json!({
                "id": Uuid::new_v4().to_string(),
                "vector": vector,
                "payload": { "page_content": doc.content, "metadata": doc.metadata },
            }));
        }

        let url = format!("{}/points?wait=true", self.collection_url());
        self.send(
            self.request(reqwest::Method::PUT, &url)
                .json(&serde_json::json!({ "points": points })),
        )
        .await?;

        tracing::info!(count = points.len(), "indexed documents into Qdrant");
        Ok(points.len())
    }
}

// -- Qdrant API request/response types --

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f64,
    #[serde(default)]
    payload: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ScoredPoint {
    /// Points without text are dropped.
    fn into_hit(self) -> Option<SearchHit> {
        let mut payload = self.payload?;
        let content = match payload.remove("page_content") {
            Some(serde_json::Value::String(text)) if !text.is_empty() => text,
            _ => return None,
        };

        let metadata: Metadata = match payload.remove("metadata") {
            Some(serde_json::Value::Object(map)) => map
                .iter()
                .filter_map(|(k, v)| MetadataValue::from_json(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => Metadata::new(),
        };

        Some(SearchHit {
            content,
            metadata,
            score: self.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
            Ok(vec![0.5, 0.5])
        }
    }

    fn engine_for(url: String) -> QdrantVectorEngine {
        let config = VectorEngineConfig {
            url,
            collection: "docs".to_string(),
            api_key: Some("qk".to_string()),
        };
        QdrantVectorEngine::new(config, Arc::new(FixedEmbedder), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_payload_to_hits() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/collections/docs/points/search")
            .match_header("api-key", "qk")
            .match_body(Matcher::PartialJson(serde_json::json!({ "limit": 5, "with_payload": true })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "result": [
                        { "id": 1, "score": 0.92, "payload": {
                            "page_content": "Helmets are mandatory.",
                            "metadata": { "source": "act.pdf", "page": 3 }
                        }},
                        { "id": 2, "score": 0.40, "payload": { "metadata": {} } }
                    ],
                    "status": "ok"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let hits = engine_for(server.url()).search("helmet", 5).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Helmets are mandatory.");
        assert_eq!(hits[0].metadata.get("page"), Some(&MetadataValue::Number(3.0)));
        assert!((hits[0].score - 0.92).abs() < f64::EPSILON);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_backend_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/collections/docs/points/search")
            .with_status(404)
            .with_body("Collection not found")
            .create_async()
            .await;

        let err = engine_for(server.url()).search("helmet", 5).await.unwrap_err();
        assert!(err.is_backend_unavailable());
        assert!(err.to_string().contains("404"));
    }
}
