//! Graph engine backed by Neo4j's HTTP transactional Cypher endpoint.
//!
//! Documents are linked to the capitalized entities they mention:
//! `(:Document)-[:MENTIONS]->(:Entity)`. A search extracts entities from the
//! query the same way and ranks documents by how many of them they mention.
//! A query with no entities yields no results without touching the server.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EngineKind, GraphEngineConfig, Metadata, MetadataValue, SearchHit};
use crate::domain::ports::{DocumentIndexer, RetrievalEngine};

static ENTITY_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-zA-Z]+\b"));

const SEARCH_CYPHER: &str = "MATCH (d:Document)-[:MENTIONS]->(e:Entity) \
WHERE e.name IN $entities \
WITH d, count(e) AS score \
ORDER BY score DESC \
LIMIT $k \
RETURN d.content AS content, d.source AS source, score";

const CREATE_DOCUMENT_CYPHER: &str = "MERGE (d:Document {id: $doc_id}) \
SET d.content = $content, d.source = $source \
WITH d \
UNWIND $entities AS entity_name \
MERGE (e:Entity {name: entity_name}) \
MERGE (d)-[:MENTIONS]->(e)";

/// Capitalized words of at least two letters, deduplicated in first-seen order.
pub fn extract_entities(text: &str) -> Vec<String> {
    let Ok(pattern) = ENTITY_PATTERN.as_ref() else {
        return Vec::new();
    };

    let mut entities: Vec<String> = Vec::new();
    for found in pattern.find_iter(text) {
        if !entities.iter().any(|e| e == found.as_str()) {
            entities.push(found.as_str().to_string());
        }
    }
    entities
}

pub struct Neo4jGraphEngine {
    config: GraphEngineConfig,
    client: reqwest::Client,
}

impl Neo4jGraphEngine {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn new(config: GraphEngineConfig, timeout: Duration) -> DomainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::ExecutionFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn unavailable(reason: impl Into<String>) -> DomainError {
        DomainError::unavailable(EngineKind::Graph, reason)
    }

    fn password(&self) -> Option<String> {
        self.config
            .password
            .clone()
            .or_else(|| std::env::var("NEO4J_PASSWORD").ok())
    }

    /// Run statements in one auto-commit transaction.
    async fn run(&self, statements: Vec<serde_json::Value>) -> DomainResult<Vec<StatementResult>> {
        let url = format!(
            "{}/db/{}/tx/commit",
            self.config.url.trim_end_matches('/'),
            self.config.database
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.user, self.password())
            .json(&serde_json::json!({ "statements": statements }))
            .send()
            .await
            .map_err(|e| Self::unavailable(format!("Neo4j request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::unavailable(format!("Neo4j returned {status}: {body}")));
        }

        let body: TransactionResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("unexpected Neo4j response: {e}")))?;

        if let Some(error) = body.errors.first() {
            return Err(Self::unavailable(format!("{}: {}", error.code, error.message)));
        }
        Ok(body.results)
    }
}

#[async_trait]
impl RetrievalEngine for Neo4jGraphEngine {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn search(&self, query: &str, limit: usize) -> DomainResult<Vec<SearchHit>> {
        let entities = extract_entities(query);
        if entities.is_empty() {
            debug!("no entities in query; skipping graph search");
            return Ok(Vec::new());
        }

        let statement = serde_json::json!({
            "statement": SEARCH_CYPHER,
            "parameters": { "entities": entities, "k": limit },
        });
        let results = self.run(vec![statement]).await?;

        let hits: Vec<SearchHit> = results
            .into_iter()
            .flat_map(|r| r.data)
            .filter_map(|record| record_to_hit(&record.row))
            .collect();
        debug!(entities = entities.len(), hits = hits.len(), "graph search completed");
        Ok(hits)
    }
}

#[async_trait]
impl DocumentIndexer for Neo4jGraphEngine {
    async fn index_documents(&self, documents: &[SearchHit]) -> DomainResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let statements = documents
            .iter()
            .map(|doc| {
                let source = doc
                    .metadata
                    .get("source")
                    .map_or_else(|| "unknown".to_string(), ToString::to_string);
                serde_json::json!({
                    "statement": CREATE_DOCUMENT_CYPHER,
                    "parameters": {
                        "doc_id": Uuid::new_v4().to_string(),
                        "content": doc.content,
                        "source": source,
                        "entities": extract_entities(&doc.content),
                    },
                })
            })
            .collect();

        self.run(statements).await?;
        tracing::info!(count = documents.len(), "indexed documents into Neo4j");
        Ok(documents.len())
    }
}

/// Row layout follows `SEARCH_CYPHER`: `[content, source, score]`.
/// The score is the number of query entities the document mentions.
fn record_to_hit(row: &[serde_json::Value]) -> Option<SearchHit> {
    let content = row.first()?.as_str().filter(|c| !c.is_empty())?.to_string();

    let mut metadata = Metadata::new();
    if let Some(source) = row.get(1).and_then(MetadataValue::from_json) {
        metadata.insert("source".to_string(), source);
    }
    let score = row.get(2).and_then(serde_json::Value::as_f64).unwrap_or(0.0);

    Some(SearchHit {
        content,
        metadata,
        score,
    })
}

// -- Neo4j HTTP API response types --

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    row: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn engine_for(url: String) -> Neo4jGraphEngine {
        let config = GraphEngineConfig {
            url,
            password: Some("secret".to_string()),
            ..Default::default()
        };
        Neo4jGraphEngine::new(config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_extract_entities_dedups_in_order() {
        assert_eq!(
            extract_entities("Does Taipei or Kaohsiung fine riders? Taipei does."),
            vec!["Does", "Taipei", "Kaohsiung"]
        );
        assert!(extract_entities("no capitals here, or A single").is_empty());
    }

    #[tokio::test]
    async fn test_query_without_entities_skips_server() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let hits = engine_for(server.url()).search("what is the fine", 5).await.unwrap();
        assert!(hits.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_parses_rows() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/db/neo4j/tx/commit")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "statements": [{ "parameters": { "entities": ["Helmet", "Act"], "k": 3 } }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "results": [{
                        "columns": ["content", "source", "score"],
                        "data": [
                            { "row": ["Helmet Act section 31.", "act.pdf", 2], "meta": [] },
                            { "row": ["Helmet colors.", null, 1], "meta": [] }
                        ]
                    }],
                    "errors": []
                })
                .to_string(),
            )
            .create_async()
            .await;

        let hits = engine_for(server.url()).search("Helmet Act fines", 3).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata.get("source"), Some(&MetadataValue::from("act.pdf")));
        assert!((hits[0].score - 2.0).abs() < f64::EPSILON);
        assert!(hits[1].metadata.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cypher_error_is_backend_unavailable() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/db/neo4j/tx/commit")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"results":[],"errors":[{"code":"Neo.ClientError.Security.Unauthorized","message":"bad credentials"}]}"#)
            .create_async()
            .await;

        let err = engine_for(server.url()).search("Helmet", 3).await.unwrap_err();
        assert!(err.is_backend_unavailable());
        assert!(err.to_string().contains("bad credentials"));
    }
}
